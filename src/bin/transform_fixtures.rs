use anyhow::Result;
use std::process::ExitCode;

#[cfg(feature = "cli")]
mod main {
    use super::*;
    use anyhow::bail;
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;
    use transform_fixtures::{
        FixtureKind,
        config::GenerationConfig,
        generate::{self, DEFAULT_FIXTURE_COUNT},
        io::util::{parse_ron_file, write_ron_file},
        sample,
        verify,
    };

    #[derive(Debug, Parser)]
    #[command(
        version,
        about = "Generate golden data for 3D matrix math",
        long_about = None
    )]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Generate a fixture file for a single kind
        Generate {
            /// Kind of fixture to generate
            #[arg(value_enum)]
            kind: FixtureKind,
            /// Path of the fixture file to write
            output_file: PathBuf,
            /// Number of fixtures to generate (none if negative)
            #[arg(default_value_t = DEFAULT_FIXTURE_COUNT as i64, allow_negative_numbers = true)]
            count: i64,
            /// Seed for the random engine (derived from the clock if omitted)
            #[arg(short, long)]
            seed: Option<u64>,
        },
        /// Generate fixture files for several kinds
        GenerateAll {
            /// Path to RON configuration file to use
            #[arg(short, long)]
            config: Option<PathBuf>,
            /// Directory to write the fixture files to (overrides the
            /// configuration)
            #[arg(short, long)]
            output_dir: Option<PathBuf>,
            /// Number of fixtures to generate per kind (overrides the
            /// configuration)
            #[arg(short = 'n', long)]
            count: Option<usize>,
            /// Seed for the random engine (overrides the configuration)
            #[arg(short, long)]
            seed: Option<u64>,
        },
        /// Generate the default RON configuration file
        GenerateConfig {
            /// Path where the file should be written
            #[arg(short, long)]
            output_path: PathBuf,
            /// Overwrite any existing file at the given path
            #[arg(short, long)]
            force_overwrite: bool,
        },
        /// Check that the records in a fixture file are consistent
        Verify {
            /// Kind of fixture the file holds
            #[arg(value_enum)]
            kind: FixtureKind,
            /// Path of the fixture file to verify
            file: PathBuf,
        },
    }

    pub fn main() -> Result<ExitCode> {
        let cli = match Cli::try_parse() {
            Ok(cli) => cli,
            // Help and version requests
            Err(err) if !err.use_stderr() => {
                err.print()?;
                return Ok(ExitCode::SUCCESS);
            }
            Err(err) => {
                err.print()?;
                return Ok(ExitCode::FAILURE);
            }
        };

        env_logger::init();

        run(cli.command)?;
        Ok(ExitCode::SUCCESS)
    }

    fn run(command: Command) -> Result<()> {
        match command {
            Command::Generate {
                kind,
                output_file,
                count,
                seed,
            } => {
                let seed = seed.unwrap_or_else(sample::seed_from_clock);
                log::info!("Using seed {}", seed);
                let count = generate::fixture_count_from_request(count);
                let mut rng = sample::create_fixture_rng(seed);
                generate::generate_fixture_file(kind, count, &mut rng, output_file)
            }
            Command::GenerateAll {
                config,
                output_dir,
                count,
                seed,
            } => {
                let mut config = match config {
                    Some(file_path) => parse_ron_file(file_path)?,
                    None => GenerationConfig::default(),
                };
                if let Some(output_dir) = output_dir {
                    config.output_dir = output_dir;
                }
                if let Some(count) = count {
                    config.count = count;
                }
                if seed.is_some() {
                    config.seed = seed;
                }
                generate::generate_all(&config).map(|_| ())
            }
            Command::GenerateConfig {
                output_path,
                force_overwrite,
            } => {
                if !force_overwrite && output_path.exists() {
                    bail!("File {} already exists", output_path.display());
                }
                let config = GenerationConfig::default();
                write_ron_file(&config, output_path)
            }
            Command::Verify { kind, file } => {
                let report = verify::verify_fixture_file(kind, &file)?;
                report.log_summary();
                if !report.is_success() {
                    bail!(
                        "Verification of {} failed: {} inconsistent records, {} property violations",
                        file.display(),
                        report.failed_records.len(),
                        report.property_violations.len()
                    );
                }
                Ok(())
            }
        }
    }
}

#[cfg(not(feature = "cli"))]
mod main {
    use super::*;

    pub fn main() -> Result<ExitCode> {
        anyhow::bail!("This binary requires the `cli` feature to be enabled.")
    }
}

fn main() -> Result<ExitCode> {
    main::main()
}
