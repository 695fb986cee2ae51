mod infra;
mod runtime;
mod script;

fn main() {
    runtime::run_from_args();
}
