use clap::Parser;
use std::process;
use wsclock_sim::config::Config;
use wsclock_sim::logger::ConsoleLogger;
use wsclock_sim::run_simulation;

fn init_msg() {
    println!("demand paging simulation");
}

fn main() {
    init_msg();
    let config = Config::parse();
    ConsoleLogger::init(config.log_level);
    config.display();
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        process::exit(1);
    }
    println!();
    match run_simulation(config) {
        Ok(tracker) => println!("{}", tracker),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
