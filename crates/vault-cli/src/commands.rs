//! Command handlers
//!
//! Each handler returns the text to print so the binary stays a thin shell.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing::debug;
use vault_core::{
    analyze, generate, ConfigManager, FileStorage, NewSecret, SecretString, SecretUpdate,
    SecretVault, VaultConfig, VaultSession,
};

use crate::cli::{Args, Command, ConfigAction, GeneratorArgs, MetaArgs};
use crate::output;

/// Opened vault plus the settings it was opened with
struct Context {
    vault: SecretVault,
    config: VaultConfig,
    passphrase: Option<String>,
}

impl Context {
    async fn open(data_dir: PathBuf, passphrase: Option<String>) -> Result<Self> {
        let config = load_config(&data_dir);
        let storage = FileStorage::open(data_dir.clone())
            .await
            .with_context(|| format!("Failed to open vault at {:?}", data_dir))?;

        Ok(Self {
            vault: SecretVault::new(Arc::new(storage), config.kdf)
                .with_auto_lock(config.auto_lock_timeout_minutes),
            config,
            passphrase,
        })
    }

    fn master_passphrase(&self) -> Result<SecretString> {
        match &self.passphrase {
            Some(passphrase) => Ok(SecretString::new(passphrase.clone())),
            None => prompt_secret("Master passphrase: "),
        }
    }

    async fn unlock(&self, user: &str) -> Result<VaultSession> {
        let passphrase = self.master_passphrase()?;
        Ok(self.vault.unlock(user, passphrase.expose()).await?)
    }

    fn generate(&self, args: &GeneratorArgs) -> Result<String> {
        generate_with(&self.config, args)
    }
}

/// Run one parsed command and return its printable output
pub async fn run(args: Args) -> Result<String> {
    let Args {
        data_dir,
        passphrase,
        command,
        ..
    } = args;
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    debug!("Using vault data directory {:?}", data_dir);

    match command {
        Command::Generate { generator } => generate_with(&load_config(&data_dir), &generator),
        Command::Analyze { secret } => {
            let secret = match secret {
                Some(secret) => SecretString::new(secret),
                None => prompt_secret("Secret: ")?,
            };
            Ok(output::assessment(&analyze(secret.expose())))
        }
        Command::Config { action } => configure(&data_dir, action).await,
        command => {
            let ctx = Context::open(data_dir, passphrase).await?;
            run_with_vault(&ctx, command).await
        }
    }
}

async fn run_with_vault(ctx: &Context, command: Command) -> Result<String> {
    match command {
        Command::Init { user } => {
            let passphrase = confirmed_passphrase(ctx.passphrase.clone(), "Master passphrase: ")?;
            let session = ctx.vault.create_account(&user, passphrase.expose()).await?;
            Ok(format!(
                "Created account {} ({})",
                session.username(),
                session.account_id()
            ))
        }

        Command::Add {
            user,
            meta,
            generate,
            generator,
        } => {
            let session = ctx.unlock(&user).await?;
            let secret = if generate {
                SecretString::new(ctx.generate(&generator)?)
            } else {
                prompt_secret("Secret: ")?
            };

            let record = ctx
                .vault
                .add_secret(&session, new_secret(meta), secret.expose())
                .await?;
            Ok(format!(
                "{}\n{}",
                output::record_line(&record),
                output::assessment(&analyze(secret.expose()))
            ))
        }

        Command::List {
            user,
            search,
            category,
        } => {
            let session = ctx.unlock(&user).await?;
            let records = ctx
                .vault
                .search(&session, search.as_deref(), category.as_deref())
                .await?;

            if records.is_empty() {
                return Ok(if search.is_some() || category.is_some() {
                    "No matching secrets".to_string()
                } else {
                    "No secrets stored".to_string()
                });
            }
            Ok(records
                .iter()
                .map(output::record_line)
                .collect::<Vec<_>>()
                .join("\n"))
        }

        Command::Categories { user } => {
            let session = ctx.unlock(&user).await?;
            let categories = ctx.vault.categories(&session).await?;
            if categories.is_empty() {
                return Ok("No categories yet".to_string());
            }
            Ok(categories.join("\n"))
        }

        Command::Reveal { user, id } => {
            let session = ctx.unlock(&user).await?;
            let secret = ctx.vault.reveal(&session, id).await?;
            Ok(secret.expose().to_string())
        }

        Command::Edit {
            user,
            id,
            name,
            site,
            account,
            category,
            tags,
            new_secret,
            generate,
            generator,
        } => {
            let session = ctx.unlock(&user).await?;
            let secret = if generate {
                Some(ctx.generate(&generator)?)
            } else if new_secret {
                Some(prompt_secret("New secret: ")?.into_inner())
            } else {
                None
            };

            let update = SecretUpdate {
                name,
                site: site.map(Some),
                account_label: account.map(Some),
                category,
                tags: tags.map(|tags| tags.into_iter().collect()),
                secret,
            };
            let record = ctx.vault.update(&session, id, update).await?;
            Ok(output::record_line(&record))
        }

        Command::Delete { user, id } => {
            let session = ctx.unlock(&user).await?;
            ctx.vault.delete(&session, id).await?;
            Ok(format!("Deleted secret {}", id))
        }

        Command::Health { user, json } => {
            let session = ctx.unlock(&user).await?;
            let health = ctx.vault.health(&session).await?;
            if json {
                Ok(serde_json::to_string_pretty(&health)?)
            } else {
                Ok(output::health(&health))
            }
        }

        Command::Passwd {
            user,
            new_passphrase,
        } => {
            let current = ctx.master_passphrase()?;
            let mut session = ctx.vault.unlock(&user, current.expose()).await?;
            let new_passphrase = confirmed_passphrase(new_passphrase, "New master passphrase: ")?;

            ctx.vault
                .change_passphrase(&mut session, current.expose(), new_passphrase.expose())
                .await?;
            Ok(format!("Passphrase changed for {}", session.username()))
        }

        Command::Generate { .. } | Command::Analyze { .. } | Command::Config { .. } => {
            bail!("command does not need an open vault")
        }
    }
}

fn load_config(data_dir: &Path) -> VaultConfig {
    ConfigManager::new(data_dir).get().clone()
}

async fn configure(data_dir: &Path, action: Option<ConfigAction>) -> Result<String> {
    let mut manager = ConfigManager::new(data_dir);
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {}
        ConfigAction::Set(set) => {
            let mut config = manager.get().clone();
            if !set.apply(&mut config) {
                bail!("Nothing to set; pass at least one option");
            }
            manager.update(config).await?;
        }
        ConfigAction::Reset => manager.reset().await?,
    }
    Ok(serde_json::to_string_pretty(manager.get())?)
}

fn generate_with(config: &VaultConfig, args: &GeneratorArgs) -> Result<String> {
    let length = args.length.unwrap_or(config.generator.length);
    let classes = args.classes(config.generator.classes);
    Ok(generate(length, &classes)?)
}

fn new_secret(meta: MetaArgs) -> NewSecret {
    NewSecret {
        name: meta.name,
        site: meta.site,
        account_label: meta.account,
        category: meta.category,
        tags: meta.tags.into_iter().collect(),
    }
}

fn prompt_secret(prompt: &str) -> Result<SecretString> {
    let value = rpassword::prompt_password(prompt).context("Failed to read from terminal")?;
    Ok(SecretString::new(value))
}

/// Use the supplied passphrase, or prompt twice and require a match
fn confirmed_passphrase(supplied: Option<String>, prompt: &str) -> Result<SecretString> {
    if let Some(passphrase) = supplied {
        return Ok(SecretString::new(passphrase));
    }

    let first = prompt_secret(prompt)?;
    let second = prompt_secret("Confirm passphrase: ")?;
    if first.expose() != second.expose() {
        bail!("Passphrases do not match");
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;
    use vault_core::{KeyDerivationParams, VaultError, VaultHealth};

    async fn test_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(temp_dir.path());
        manager.get_mut().kdf = KeyDerivationParams {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
        };
        manager.save().await.unwrap();
        temp_dir
    }

    async fn vaultctl(dir: &TempDir, passphrase: &str, rest: &[&str]) -> Result<String> {
        let dir = dir.path().to_string_lossy().to_string();
        let mut argv = vec!["vaultctl", "--data-dir", dir.as_str(), "--passphrase", passphrase];
        argv.extend_from_slice(rest);
        run(Args::parse_from(argv)).await
    }

    fn first_id(listing: &str) -> String {
        listing.split_whitespace().next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let dir = test_dir().await;

        let out = vaultctl(&dir, "pw", &["init", "-u", "alice"]).await.unwrap();
        assert!(out.starts_with("Created account alice"));

        let out = vaultctl(
            &dir,
            "pw",
            &["add", "-u", "alice", "--name", "GitHub", "--tag", "dev", "--generate", "--length", "24"],
        )
        .await
        .unwrap();
        assert!(out.contains("GitHub"));
        assert!(out.contains("Strength:"));

        let listing = vaultctl(&dir, "pw", &["list", "-u", "alice"]).await.unwrap();
        assert!(listing.contains("GitHub  [general]  #dev"));
        let id = first_id(&listing);

        let secret = vaultctl(&dir, "pw", &["reveal", "-u", "alice", &id]).await.unwrap();
        assert_eq!(secret.chars().count(), 24);

        let out = vaultctl(&dir, "pw", &["edit", "-u", "alice", &id, "--category", "work"])
            .await
            .unwrap();
        assert!(out.contains("[work]"));

        let empty = vaultctl(&dir, "pw", &["list", "-u", "alice", "--category", "general"])
            .await
            .unwrap();
        assert_eq!(empty, "No matching secrets");

        vaultctl(&dir, "pw", &["delete", "-u", "alice", &id]).await.unwrap();
        let listing = vaultctl(&dir, "pw", &["list", "-u", "alice"]).await.unwrap();
        assert_eq!(listing, "No secrets stored");
    }

    #[tokio::test]
    async fn test_health_json() {
        let dir = test_dir().await;
        vaultctl(&dir, "pw", &["init", "-u", "alice"]).await.unwrap();
        for name in ["a", "b"] {
            vaultctl(&dir, "pw", &["add", "-u", "alice", "--name", name, "--generate"])
                .await
                .unwrap();
        }

        let out = vaultctl(&dir, "pw", &["health", "-u", "alice", "--json"]).await.unwrap();
        let health: VaultHealth = serde_json::from_str(&out).unwrap();
        assert_eq!(health.total, 2);
        assert!(health.unreadable.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_passphrase_is_reported() {
        let dir = test_dir().await;
        vaultctl(&dir, "pw", &["init", "-u", "alice"]).await.unwrap();

        let err = vaultctl(&dir, "nope", &["list", "-u", "alice"]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VaultError>(),
            Some(VaultError::InvalidPassphrase)
        ));
    }

    #[tokio::test]
    async fn test_passwd_switches_passphrase() {
        let dir = test_dir().await;
        vaultctl(&dir, "old", &["init", "-u", "alice"]).await.unwrap();
        vaultctl(&dir, "old", &["add", "-u", "alice", "--name", "bank", "--generate"])
            .await
            .unwrap();
        let id = first_id(&vaultctl(&dir, "old", &["list", "-u", "alice"]).await.unwrap());
        let before = vaultctl(&dir, "old", &["reveal", "-u", "alice", &id]).await.unwrap();

        let out = vaultctl(&dir, "old", &["passwd", "-u", "alice", "--new-passphrase", "new"])
            .await
            .unwrap();
        assert_eq!(out, "Passphrase changed for alice");

        assert!(vaultctl(&dir, "old", &["list", "-u", "alice"]).await.is_err());
        let after = vaultctl(&dir, "new", &["reveal", "-u", "alice", &id]).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_generate_uses_config_defaults() {
        let dir = test_dir().await;
        let mut manager = ConfigManager::new(dir.path());
        manager.get_mut().generator.length = 10;
        manager.get_mut().generator.classes.include_symbols = false;
        manager.save().await.unwrap();

        let out = vaultctl(&dir, "pw", &["generate"]).await.unwrap();
        assert_eq!(out.len(), 10);
        assert!(out.chars().all(|c| c.is_ascii_alphanumeric()));

        let out = vaultctl(
            &dir,
            "pw",
            &["generate", "--length", "4", "--no-upper", "--no-lower", "--no-symbols"],
        )
        .await
        .unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_alphabet() {
        let dir = test_dir().await;
        let result = vaultctl(
            &dir,
            "pw",
            &["generate", "--no-upper", "--no-lower", "--no-digits", "--no-symbols"],
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_analyze_and_config() {
        let dir = test_dir().await;

        let out = vaultctl(&dir, "pw", &["analyze", "Tr0ub4dor&3xZq!9"]).await.unwrap();
        assert_eq!(out, "Strength: 100/100 (strong, green)");

        let out = vaultctl(&dir, "pw", &["config"]).await.unwrap();
        let config: VaultConfig = serde_json::from_str(&out).unwrap();
        assert_eq!(config.kdf.memory_cost, 8192);
    }

    #[tokio::test]
    async fn test_search_and_categories() {
        let dir = test_dir().await;
        vaultctl(&dir, "pw", &["init", "-u", "alice"]).await.unwrap();
        for (name, site, category) in [
            ("Mail", "mail.example.com", "work"),
            ("Bank", "bank.test", "finance"),
            ("Chat", "chat.example.com", "general"),
        ] {
            vaultctl(
                &dir,
                "pw",
                &[
                    "add", "-u", "alice", "--name", name, "--site", site, "--category", category,
                    "--generate",
                ],
            )
            .await
            .unwrap();
        }

        let hits = vaultctl(&dir, "pw", &["list", "-u", "alice", "--search", "EXAMPLE"])
            .await
            .unwrap();
        assert_eq!(hits.lines().count(), 2);
        assert!(hits.contains("Chat") && hits.contains("Mail"));

        let hits = vaultctl(
            &dir,
            "pw",
            &["list", "-u", "alice", "-s", "example", "--category", "work"],
        )
        .await
        .unwrap();
        assert_eq!(hits.lines().count(), 1);
        assert!(hits.contains("Mail"));

        let categories = vaultctl(&dir, "pw", &["categories", "-u", "alice"]).await.unwrap();
        assert_eq!(categories, "finance\ngeneral\nwork");
    }

    #[tokio::test]
    async fn test_config_set_and_reset() {
        let dir = test_dir().await;

        let out = vaultctl(&dir, "pw", &["config", "set", "--auto-lock-minutes", "5"])
            .await
            .unwrap();
        let config: VaultConfig = serde_json::from_str(&out).unwrap();
        assert_eq!(config.auto_lock_timeout_minutes, 5);
        assert_eq!(config.kdf.memory_cost, 8192);
        assert_eq!(
            ConfigManager::new(dir.path()).get().auto_lock_timeout_minutes,
            5
        );

        assert!(vaultctl(&dir, "pw", &["config", "set"]).await.is_err());
        assert!(vaultctl(&dir, "pw", &["config", "set", "--generator-length", "0"])
            .await
            .is_err());

        let out = vaultctl(&dir, "pw", &["config", "reset"]).await.unwrap();
        let config: VaultConfig = serde_json::from_str(&out).unwrap();
        assert_eq!(config, VaultConfig::default());
        assert!(!dir.path().join("config.json").exists());
    }
}
