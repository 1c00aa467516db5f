use crate::policy::PolicyKind;
use clap::Parser;
use log::LevelFilter;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use thiserror::Error;

/// Configuration problems detected before a simulation is built.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("'frames' must be at least 1")]
    NoFrames,
    #[error("'max_virtual_pages' must be at least 1")]
    NoVirtualPages,
    #[error("'max_ttl' must be at least 1")]
    NoTimeToLive,
    #[error("'working_set_size' must be at least 1")]
    EmptyWorkingSet,
    #[error("'{name}' must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of physical frames shared by all processes.
    #[arg(long, default_value_t = env_or_default("SIM_FRAMES", 32))]
    pub frames: usize,

    /// Upper bound on the number of pages in a process's address space.
    #[arg(long, default_value_t = env_or_default("SIM_MAX_VIRTUAL_PAGES", 48))]
    pub max_virtual_pages: usize,

    #[arg(long, default_value_t = env_or_default("SIM_PROCESSES", 3))]
    pub processes: usize,

    #[arg(long, default_value_t = env_or_default("SIM_TICKS", 1000))]
    pub ticks: u64,

    /// Upper bound on a process's time to live, counted in scheduled turns.
    #[arg(long, default_value_t = env_or_default("SIM_MAX_TTL", 1000))]
    pub max_ttl: u64,

    #[arg(long, default_value_t = env_or_default("SIM_WORKING_SET_SIZE", 12))]
    pub working_set_size: usize,

    /// Ticks between working set refreshes, 0 to keep the first one.
    #[arg(long, default_value_t = env_or_default("SIM_WORKING_SET_INTERVAL", 50))]
    pub working_set_interval: u64,

    /// Every n-th tick runs system work instead of a user process, 0 to disable.
    #[arg(long, default_value_t = env_or_default("SIM_SYSTEM_INTERVAL", 10))]
    pub system_interval: u64,

    /// Probability that a reference targets the working set.
    #[arg(long, default_value_t = env_or_default("SIM_LOCALITY", 0.9))]
    pub locality: f64,

    /// Probability that a reference is a write.
    #[arg(long, default_value_t = env_or_default("SIM_WRITE_RATIO", 0.3))]
    pub write_ratio: f64,

    #[arg(long, value_enum, default_value_t = env_or_default("SIM_POLICY", PolicyKind::WsClock))]
    pub policy: PolicyKind,

    /// Seed for every random source. Omit for a fresh run each time.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = env_or_default("SIM_LOG_LEVEL", LevelFilter::Warn))]
    pub log_level: LevelFilter,

    /// Check the page/frame invariants after every tick.
    #[arg(long)]
    pub validate: bool,

    #[arg(long)]
    pub no_progress: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        self.engine().validate()?;
        if self.max_ttl == 0 {
            return Err(Error::NoTimeToLive);
        }
        if self.working_set_size == 0 {
            return Err(Error::EmptyWorkingSet);
        }
        check_probability("locality", self.locality)?;
        check_probability("write_ratio", self.write_ratio)
    }

    pub fn display(&self) {
        println!("simulation configuration values: ");
        println!("{:#?}", self);
    }

    /// The subset of the configuration the memory-management engine is built from.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            frame_count: self.frames,
            max_virtual_pages: self.max_virtual_pages,
            policy: self.policy,
        }
    }
}

/// Construction parameters of the memory-management engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub frame_count: usize,
    pub max_virtual_pages: usize,
    pub policy: PolicyKind,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.frame_count == 0 {
            Err(Error::NoFrames)
        } else if self.max_virtual_pages == 0 {
            Err(Error::NoVirtualPages)
        } else {
            Ok(())
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), Error> {
    match (0.0..=1.0).contains(&value) {
        true => Ok(()),
        false => Err(Error::Probability { name, value }),
    }
}

fn env_or_default<T>(varname: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match env::var(varname) {
        Ok(val) => val
            .parse()
            .unwrap_or_else(|e| panic!("invalid value for env var '{}': {:?}", varname, e)),
        _ => default,
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn standard_config() -> Config {
        Config::parse_from(["wsclock_sim"])
    }

    #[cfg(test)]
    mod config_tests {

        use super::*;

        #[test]
        fn parse_flags() {
            let config = Config::parse_from([
                "wsclock_sim",
                "--frames",
                "4",
                "--policy",
                "random",
                "--seed",
                "9",
                "--log-level",
                "debug",
                "--validate",
            ]);
            assert_eq!(config.frames, 4);
            assert_eq!(config.policy, PolicyKind::Random);
            assert_eq!(config.seed, Some(9));
            assert_eq!(config.log_level, LevelFilter::Debug);
            assert!(config.validate);
            assert!(!config.no_progress);
        }

        #[test]
        fn validate_defaults() {
            let mut config = standard_config();
            config.frames = 32;
            config.max_virtual_pages = 48;
            config.max_ttl = 1000;
            config.working_set_size = 12;
            config.locality = 0.9;
            config.write_ratio = 0.3;
            assert_eq!(config.validate(), Ok(()));
        }

        #[test]
        fn validate_rejects() {
            let mut config = standard_config();
            config.frames = 0;
            assert_eq!(config.validate(), Err(Error::NoFrames));

            config.frames = 2;
            config.max_virtual_pages = 0;
            assert_eq!(config.validate(), Err(Error::NoVirtualPages));

            config.max_virtual_pages = 2;
            config.max_ttl = 0;
            assert_eq!(config.validate(), Err(Error::NoTimeToLive));

            config.max_ttl = 2;
            config.working_set_size = 0;
            assert_eq!(config.validate(), Err(Error::EmptyWorkingSet));

            config.working_set_size = 2;
            config.locality = 0.5;
            config.write_ratio = 1.5;
            assert_eq!(
                config.validate(),
                Err(Error::Probability {
                    name: "write_ratio",
                    value: 1.5
                })
            );
        }

        #[test]
        fn engine() {
            let mut config = standard_config();
            config.frames = 7;
            config.max_virtual_pages = 5;
            config.policy = PolicyKind::Random;
            assert_eq!(
                config.engine(),
                EngineConfig {
                    frame_count: 7,
                    max_virtual_pages: 5,
                    policy: PolicyKind::Random,
                }
            );
        }

        #[test]
        fn error_message() {
            let message = Error::Probability {
                name: "locality",
                value: -1.0,
            }
            .to_string();
            assert_eq!(message, "'locality' must be a probability in [0, 1], got -1");
        }
    }
}
