use std::env::args_os;
use std::process::ExitCode;

use hiccup::{run, CLIParser};

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match run(&arguments) {
        Ok(_) => {
            println!("Conversion successful");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Conversion failed because of: {}", e);
            ExitCode::FAILURE
        }
    }
}
