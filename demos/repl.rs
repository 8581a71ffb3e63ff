use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use snek::evaluator::{self, Environment};
use snek::value::Value;
use snek::{Error, parse_source};
use std::process;
use std::thread;

/// Native stack for the interpreter thread, well above what `MAX_EVAL_DEPTH` needs
const INTERPRETER_STACK_SIZE: usize = 16 * 1024 * 1024;

fn main() {
    env_logger::init();

    let files: Vec<String> = std::env::args().skip(1).collect();

    let result = thread::Builder::new()
        .name("snek".to_owned())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run_driver(&files));

    let panic_info = match result {
        Ok(handle) => match handle.join() {
            Ok(()) => return,
            Err(panic_info) => panic_info,
        },
        Err(err) => {
            eprintln!("Could not start the interpreter thread: {err}");
            process::exit(1);
        }
    };

    eprintln!("The REPL encountered an unexpected error and must exit.");
    if let Some(msg) = panic_info.downcast_ref::<&str>() {
        eprintln!("Error: {msg}");
    } else if let Some(msg) = panic_info.downcast_ref::<String>() {
        eprintln!("Error: {msg}");
    } else {
        eprintln!("Error: Unknown panic occurred");
    }
    process::exit(1);
}

fn run_driver(files: &[String]) {
    let global = evaluator::create_global_env();
    let env = Environment::with_parent(&global);

    for path in files {
        match evaluate_file(path, &env) {
            Ok(value) => log::info!("loaded {path}: {value}"),
            Err(err) => {
                eprintln!("{path}: {err}");
                process::exit(1);
            }
        }
    }

    run_repl(&env);
}

/// Evaluate a whole source file as one program in `env`
fn evaluate_file(path: &str, env: &Environment) -> Result<Value, Error> {
    let source = std::fs::read_to_string(path)
        .map_err(|err| Error::EvaluationError(format!("cannot read {path}: {err}")))?;
    let expr = parse_source(&source)?;
    evaluator::evaluate(&expr, env)
}

fn run_repl(env: &Environment) {
    println!("Snek interpreter");
    println!("Enter expressions like: (+ 1 2)");
    println!("Type :help for more commands, or QUIT to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return;
        }
    };

    loop {
        match rl.readline("in> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(env);
                        continue;
                    }
                    "QUIT" | "q" | ":quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match parse_source(line).and_then(|expr| evaluator::evaluate(&expr, env)) {
                    Ok(value) => println!("out> {value}"),
                    Err(err) => println!("out> {err}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Snek interpreter commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter (also QUIT or q)");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Language:");
    println!("  Numbers: 42, -5, 2.5");
    println!("  Constants: #t, #f, nil");
    println!("  Arithmetic: +, -, *, /");
    println!("  Comparison: =?, <, >, <=, >=");
    println!("  Logic: and, or, not");
    println!("  Definitions: (:= x 5), (:= (square x) (* x x)), (function (x) (* x x))");
    println!("  Scope: (let ((x 1) (y 2)) (+ x y)), (set! x 6), (del x), (begin ...)");
    println!("  Lists: cons, car, cdr, list, length, elt-at-index, concat, map, filter, reduce");
    println!();
    println!("Comments start with ; and run to the end of the line.");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in procedures from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Builtin { .. } => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in procedures ({}):", builtins.len());
        // Print in columns for readability
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
