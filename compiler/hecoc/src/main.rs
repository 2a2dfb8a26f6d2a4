//! HECO CLI
//!
//! Runs serialized programs against the simulated ciphertext backend.

use hecoc::{cleartext_to_json, init_tracing, ExecError, ExecutionConfig, Inputs, Program};
use heco_ir::TreePrinter;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: heco run <program.json> --inputs=<inputs.json> --outputs=a,b [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --slots=<n>       Slots per ciphertext (default: 16)");
                eprintln!("  --no-rewrite      Skip control-flow rewriting");
                eprintln!("  --json            Print outputs as JSON");
                std::process::exit(1);
            }
            run(&args[2], &args[3..])
        }
        "print" => {
            if args.len() < 3 {
                eprintln!("Usage: heco print <program.json>");
                std::process::exit(1);
            }
            print(&args[2])
        }
        "taint" => {
            if args.len() < 3 {
                eprintln!("Usage: heco taint <program.json> [--inputs=<inputs.json>]");
                std::process::exit(1);
            }
            taint(&args[2], &args[3..])
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("HECO - evaluate programs over encrypted data");
    println!();
    println!("Usage: heco <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <program.json>     Execute a program and print its outputs");
    println!("  print <program.json>   Print the program as source and as a tree");
    println!("  taint <program.json>   Show which statements depend on secrets");
    println!("  help                   Show this message");
    println!();
    println!("Run options:");
    println!("  --inputs=<file>        JSON array of {{ name, type, value }}");
    println!("  --outputs=<a,b>        Identifiers to decrypt and print");
    println!("  --slots=<n>            Slots per ciphertext (default: 16)");
    println!("  --no-rewrite           Skip control-flow rewriting");
    println!("  --json                 Print outputs as JSON");
    println!();
    println!("Set RUST_LOG=debug to trace the phases.");
}

/// Options shared by `run` and `taint`.
#[derive(Default)]
struct RunOptions {
    inputs: Option<String>,
    outputs: Vec<String>,
    config: ExecutionConfig,
    json: bool,
}

fn parse_options(args: &[String]) -> RunOptions {
    let mut options = RunOptions::default();
    for arg in args {
        if let Some(path) = arg.strip_prefix("--inputs=") {
            options.inputs = Some(path.to_string());
        } else if let Some(names) = arg.strip_prefix("--outputs=") {
            options.outputs = names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        } else if let Some(slots) = arg.strip_prefix("--slots=") {
            match slots.parse() {
                Ok(slots) => options.config = options.config.with_slots(slots),
                Err(_) => {
                    eprintln!("error: invalid slot count `{slots}`");
                    std::process::exit(1);
                }
            }
        } else if arg == "--no-rewrite" {
            options.config = options.config.with_rewrite(false);
        } else if arg == "--json" {
            options.json = true;
        } else {
            eprintln!("warning: ignoring unknown option `{arg}`");
        }
    }
    options
}

fn read_file(path: &str) -> Result<String, ExecError> {
    std::fs::read_to_string(path).map_err(|source| ExecError::Io {
        path: path.to_string(),
        source,
    })
}

fn load_program(path: &str) -> Result<Program, ExecError> {
    Program::from_json(&read_file(path)?)
}

fn load_inputs(path: Option<&str>) -> Result<Inputs, ExecError> {
    match path {
        Some(path) => Inputs::from_json(&read_file(path)?),
        None => Ok(Inputs::new()),
    }
}

fn run(program_path: &str, args: &[String]) -> Result<(), ExecError> {
    let options = parse_options(args);
    let program = load_program(program_path)?;
    let inputs = load_inputs(options.inputs.as_deref())?;
    let factory = options.config.factory();

    let execution = program.execute(&inputs, options.outputs.as_slice(), &factory, &options.config)?;

    if options.json {
        let values: serde_json::Map<String, serde_json::Value> = execution
            .outputs
            .iter()
            .map(|output| (output.name.clone(), cleartext_to_json(&output.value)))
            .collect();
        println!("{}", serde_json::Value::Object(values));
    } else {
        print!("{}", execution.render());
    }
    Ok(())
}

fn print(program_path: &str) -> Result<(), ExecError> {
    let program = load_program(program_path)?;
    println!("{}", program.root());
    println!();
    print!("{}", TreePrinter::with_indent(2).print(program.root()));
    Ok(())
}

fn taint(program_path: &str, args: &[String]) -> Result<(), ExecError> {
    let options = parse_options(args);
    let program = load_program(program_path)?;
    let inputs = load_inputs(options.inputs.as_deref())?;

    for statement in program.analyze(&inputs)? {
        let marker = if statement.secret { "secret" } else { "plain " };
        println!("{marker}  {}", statement.statement);
    }
    Ok(())
}
