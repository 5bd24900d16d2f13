use crate::config::DEFAULT_ENV_FILE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "resource-cloner")]
#[command(version)]
#[command(about = "Copy a questionnaire with its custom fields, triggers and actions between tenants")]
pub struct Cli {
    /// Path of the .env file holding tenant credentials
    #[arg(long, value_name = "PATH", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Directory for the JSON artifacts (overrides RESOURCE_CLONER_OUTPUT_DIR)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}
