use std::process::ExitCode;

use gnss_tracker::gnss;

pub fn handle_decode(sentence: &str) -> ExitCode {
    match gnss::decode(sentence) {
        Ok(coordinate) => {
            println!("{coordinate}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
