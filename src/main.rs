use minish::Interpreter;

fn main() {
    let result = Interpreter::new().and_then(|mut sh| sh.repl());
    if let Err(err) = result {
        eprintln!("minish: {err:#}");
        std::process::exit(1);
    }
}
