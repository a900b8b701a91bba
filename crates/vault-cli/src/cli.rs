//! Command-line arguments

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use uuid::Uuid;
use vault_core::{CharacterClasses, VaultConfig};

/// Secret Vault - encrypted credential storage with strength and reuse reports
#[derive(Parser, Debug)]
#[command(name = "vaultctl")]
#[command(author = "Symbia Labs")]
#[command(version = "0.1.0")]
#[command(about = "Secret Vault - store, generate and audit site credentials")]
pub struct Args {
    /// Vault data directory (defaults to the per-user data dir)
    #[arg(long, global = true, env = "VAULT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Master passphrase (prompted for when absent)
    #[arg(long, global = true, env = "VAULT_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new account
    Init {
        #[arg(long, short)]
        user: String,
    },
    /// Save a new secret
    Add {
        #[arg(long, short)]
        user: String,
        #[command(flatten)]
        meta: MetaArgs,
        /// Generate the secret instead of prompting for it
        #[arg(long)]
        generate: bool,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// List saved secrets (metadata only)
    List {
        #[arg(long, short)]
        user: String,
        /// Case-insensitive match on name, site or account
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// List the categories in use
    Categories {
        #[arg(long, short)]
        user: String,
    },
    /// Print one decrypted secret
    Reveal {
        #[arg(long, short)]
        user: String,
        id: Uuid,
    },
    /// Edit a secret's metadata or replace the secret
    Edit {
        #[arg(long, short)]
        user: String,
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace all tags
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
        /// Prompt for a new secret
        #[arg(long, conflicts_with = "generate")]
        new_secret: bool,
        /// Replace the secret with a generated one
        #[arg(long)]
        generate: bool,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Delete a secret
    Delete {
        #[arg(long, short)]
        user: String,
        id: Uuid,
    },
    /// Weak and reused secret report
    Health {
        #[arg(long, short)]
        user: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Generate a random secret
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Score a secret's strength
    Analyze {
        /// Secret to score (prompted for when absent)
        secret: Option<String>,
    },
    /// Change the master passphrase and re-encrypt every secret
    Passwd {
        #[arg(long, short)]
        user: String,
        /// New master passphrase (prompted for when absent)
        #[arg(long, env = "VAULT_NEW_PASSPHRASE", hide_env_values = true)]
        new_passphrase: Option<String>,
    },
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Change individual settings
    Set(ConfigSetArgs),
    /// Restore defaults and remove the config file
    Reset,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ConfigSetArgs {
    /// Minutes before an unlocked session expires (0 = never)
    #[arg(long)]
    pub auto_lock_minutes: Option<u32>,
    /// Default length of generated secrets
    #[arg(long)]
    pub generator_length: Option<usize>,
    /// Argon2id memory cost in KiB for new and re-keyed accounts
    #[arg(long)]
    pub kdf_memory_cost: Option<u32>,
    #[arg(long)]
    pub kdf_time_cost: Option<u32>,
    #[arg(long)]
    pub kdf_parallelism: Option<u32>,
}

impl ConfigSetArgs {
    /// Apply the given settings; false when nothing was given
    pub fn apply(&self, config: &mut VaultConfig) -> bool {
        let mut changed = false;
        if let Some(minutes) = self.auto_lock_minutes {
            config.auto_lock_timeout_minutes = minutes;
            changed = true;
        }
        if let Some(length) = self.generator_length {
            config.generator.length = length;
            changed = true;
        }
        if let Some(memory_cost) = self.kdf_memory_cost {
            config.kdf.memory_cost = memory_cost;
            changed = true;
        }
        if let Some(time_cost) = self.kdf_time_cost {
            config.kdf.time_cost = time_cost;
            changed = true;
        }
        if let Some(parallelism) = self.kdf_parallelism {
            config.kdf.parallelism = parallelism;
            changed = true;
        }
        changed
    }
}

#[derive(ClapArgs, Debug, Default)]
pub struct MetaArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub site: Option<String>,
    /// Login or account name at the site
    #[arg(long)]
    pub account: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(ClapArgs, Debug, Default, Clone, Copy)]
pub struct GeneratorArgs {
    /// Length of generated secrets
    #[arg(long)]
    pub length: Option<usize>,
    #[arg(long)]
    pub no_upper: bool,
    #[arg(long)]
    pub no_lower: bool,
    #[arg(long)]
    pub no_digits: bool,
    #[arg(long)]
    pub no_symbols: bool,
}

impl GeneratorArgs {
    /// Apply the `--no-*` switches on top of configured classes
    pub fn classes(&self, base: CharacterClasses) -> CharacterClasses {
        CharacterClasses {
            include_upper: base.include_upper && !self.no_upper,
            include_lower: base.include_lower && !self.no_lower,
            include_digits: base.include_digits && !self.no_digits,
            include_symbols: base.include_symbols && !self.no_symbols,
        }
    }
}
