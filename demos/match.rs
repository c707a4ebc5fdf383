extern crate env_logger;
extern crate refsm;

use std::env;
use std::io::BufRead;
use std::process;

use refsm::Dfa;

fn main() {
    env_logger::init();

    let pattern = match env::args().nth(1) {
        Some(pattern) => pattern,
        None => {
            eprintln!("usage: match REGEX < lines");
            process::exit(2);
        }
    };
    let dfa: Dfa = match pattern.parse() {
        Ok(dfa) => dfa,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    println!("Minimized DFA: {}\n", dfa);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        };
        let verdict = if dfa.accepts(&line) { "accept" } else { "reject" };
        println!("{}: {:?}", verdict, line);
    }
}
