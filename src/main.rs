use std::process::exit;

use paws::app::{notify, run_cli, Notice};

fn main() {
    if let Err(e) = run_cli() {
        notify(Notice::Error, &e);
        exit(1);
    }
}
