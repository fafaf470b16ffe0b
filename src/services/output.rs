use crate::domain::models::{ErrorBody, JsonErr, JsonOut};
use crate::error::report_error;
use serde::Serialize;

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

pub fn print_error(json: bool, err: &anyhow::Error) -> u8 {
    let (code, exit) = match report_error(err) {
        Some(kind) => (kind.code(), kind.exit_code()),
        None => ("ERROR", 1),
    };
    let message = format!("{:#}", err);
    if json {
        let out = JsonErr {
            ok: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };
        match serde_json::to_string_pretty(&out) {
            Ok(s) => println!("{}", s),
            Err(_) => eprintln!("error[{}]: {:#}", code, err),
        }
    } else {
        eprintln!("error[{}]: {}", code, message);
    }
    exit
}
