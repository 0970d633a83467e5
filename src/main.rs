mod app_paths;
mod assistant;
mod backend;
mod config;
mod connectivity;
mod credentials;
mod debug_log;
mod prefs;
mod storage;
mod tui;
mod usage;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::AppConfig;
use credentials::{ApiKeyStore, Provider};
use prefs::{Density, Preferences, Theme};
use usage::UsageLedger;

#[derive(Parser)]
#[command(name = "mrc-poche")]
#[command(about = "Compagnon local de la plateforme de formation MRC en Poche")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Affiche l'état local : connectivité, quotas mensuels, clés API
    Status {
        /// Vérifie aussi l'abonnement de cet adhérent auprès du backend
        #[arg(long)]
        member: Option<String>,
    },
    /// Consulte ou modifie les préférences locales
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Consulte ou comptabilise les quotas mensuels
    Usage {
        #[command(subcommand)]
        action: UsageAction,
    },
    /// Gère les clés API des intégrations tierces
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Pose une question à l'assistant de formation
    Ask {
        /// La question (tous les arguments sont joints)
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },
    /// Ouvre l'écran de surveillance de la connectivité
    Watch,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Affiche toutes les préférences
    Show,
    /// Lit une préférence brute
    Get { key: String },
    /// Écrit une préférence brute (valeur JSON ou chaîne)
    Set { key: String, value: String },
    /// Choisit le thème (light, dark, system)
    Theme { theme: String },
    /// Règle la taille de police
    FontSize { size: u32 },
    /// Règle la densité d'affichage (comfortable, compact)
    Density { density: String },
    /// Oublie les visites guidées terminées pour les rejouer
    ResetTours,
}

#[derive(Subcommand)]
enum UsageAction {
    /// Affiche le quota restant de chaque fonctionnalité
    Remaining,
    /// Comptabilise une utilisation d'une fonctionnalité
    Record { feature: String },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Liste les clés configurées (masquées)
    List,
    /// Enregistre la clé d'un fournisseur
    Set { provider: String, key: String },
    /// Vérifie si la clé d'un fournisseur est configurée
    Check { provider: String },
    /// Supprime la clé d'un fournisseur
    Forget { provider: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default();

    match cli.command {
        Command::Status { member } => run_status(&config, member).await,
        Command::Prefs { action } => run_prefs(action),
        Command::Usage { action } => run_usage(&config, action),
        Command::Keys { action } => run_keys(action),
        Command::Ask { question } => run_ask(&config, question.join(" ")).await,
        Command::Watch => tui::run_watch(config).await,
    }
}

async fn probe_connectivity(config: &AppConfig) -> Result<connectivity::Connectivity> {
    let url = config.probe_url.clone();
    let state = tokio::task::spawn_blocking(move || connectivity::probe(&url)).await?;
    Ok(state)
}

async fn run_status(config: &AppConfig, member: Option<String>) -> Result<()> {
    println!(
        "mrc-poche {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("MRC_POCHE_GIT_SHA")
    );
    println!("Données locales : {}", app_paths::app_home_dir()?.display());

    let state = probe_connectivity(config).await?;
    println!("Connectivité    : {}", state.label());

    let mut ledger = UsageLedger::open_default(config.effective_quotas())?;
    println!("Quotas mensuels :");
    let features: Vec<String> = ledger.tracked_features().map(str::to_string).collect();
    for feature in features {
        let remaining = ledger.get_remaining(&feature);
        println!("  {:<14} {}/{} restants", feature, remaining, ledger.quota(&feature));
    }

    let keys = ApiKeyStore::open_default()?;
    println!("Clés API        :");
    for provider in Provider::ALL {
        match keys.get(provider) {
            Some(key) => println!("  {:<14} {}", provider, credentials::masked(&key)),
            None => println!("  {:<14} absente", provider),
        }
    }

    if let Some(member_id) = member {
        if state.is_online() {
            let client = backend::BackendClient::new(config);
            let outcome = client.subscription_status(&member_id);
            match (outcome.data, outcome.error) {
                (Some(data), _) => {
                    println!("Abonnement      : {}", backend::plan_label(&data));
                }
                (None, Some(message)) => println!("Abonnement      : {}", message),
                (None, None) => println!("Abonnement      : réponse vide"),
            }
        } else {
            println!("Abonnement      : vérification impossible hors ligne");
        }
    }

    Ok(())
}

fn run_prefs(action: PrefsAction) -> Result<()> {
    let mut prefs = Preferences::open_default()?;

    match action {
        PrefsAction::Show => {
            println!("thème            : {}", prefs.theme().as_str());
            println!("taille de police : {}", prefs.font_size());
            println!("densité          : {}", prefs.density().as_str());
            println!(
                "bandeau masqué   : {}",
                if prefs.connectivity_banner_dismissed() { "oui" } else { "non" }
            );
            let tours = prefs.completed_tours();
            println!(
                "visites guidées  : {}",
                if tours.is_empty() { "aucune".to_string() } else { tours.join(", ") }
            );
            let history = prefs.navigation_history();
            if !history.is_empty() {
                println!("derniers écrans  : {}", history.join(" > "));
            }
        }
        PrefsAction::Get { key } => match prefs.raw(&key) {
            Some(value) => println!("{}", value),
            None => println!("(non définie)"),
        },
        PrefsAction::Set { key, value } => {
            // A value that parses as JSON is stored typed; anything else is a
            // plain string.
            let parsed = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            prefs.set_raw(&key, &parsed);
            println!("{} = {}", key, parsed);
        }
        PrefsAction::Theme { theme } => {
            let theme = match theme.to_lowercase().as_str() {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                "system" => Theme::System,
                other => anyhow::bail!("Thème inconnu : {} (light, dark, system)", other),
            };
            prefs.set_theme(theme);
            println!("Thème : {}", theme.as_str());
        }
        PrefsAction::FontSize { size } => {
            prefs.set_font_size(size);
            println!("Taille de police : {}", size);
        }
        PrefsAction::Density { density } => {
            let density = match density.to_lowercase().as_str() {
                "comfortable" => Density::Comfortable,
                "compact" => Density::Compact,
                other => anyhow::bail!("Densité inconnue : {} (comfortable, compact)", other),
            };
            prefs.set_density(density);
            println!("Densité : {}", density.as_str());
        }
        PrefsAction::ResetTours => {
            prefs.reset_tours();
            println!("Visites guidées réinitialisées.");
        }
    }

    Ok(())
}

fn run_usage(config: &AppConfig, action: UsageAction) -> Result<()> {
    let mut ledger = UsageLedger::open_default(config.effective_quotas())?;

    match action {
        UsageAction::Remaining => {
            let features: Vec<String> = ledger.tracked_features().map(str::to_string).collect();
            for feature in features {
                let remaining = ledger.get_remaining(&feature);
                println!("{:<14} {}/{} restants", feature, remaining, ledger.quota(&feature));
            }
        }
        UsageAction::Record { feature } => {
            // The ledger itself never blocks; the gate lives here, at the
            // caller, like the UI check before a PDF export.
            if ledger.get_remaining(&feature) == 0 {
                println!(
                    "Quota mensuel épuisé pour {} : réinitialisation le mois prochain.",
                    feature
                );
                return Ok(());
            }
            let remaining = ledger.record_use(&feature);
            println!("{} : {} utilisation(s) restante(s) ce mois-ci", feature, remaining);
        }
    }

    Ok(())
}

fn run_keys(action: KeysAction) -> Result<()> {
    let mut keys = ApiKeyStore::open_default()?;

    match action {
        KeysAction::List => {
            let all = keys.load_all();
            if all.is_empty() {
                println!("Aucune clé configurée.");
            }
            for (provider, key) in all {
                println!("{:<14} {}", provider, credentials::masked(&key));
            }
        }
        KeysAction::Set { provider, key } => {
            let provider = parse_provider(&provider)?;
            keys.save(provider, &key);
            println!("Clé {} enregistrée.", provider);
        }
        KeysAction::Check { provider } => {
            let provider = parse_provider(&provider)?;
            if keys.has(provider) {
                println!("Clé {} configurée.", provider);
            } else {
                println!(
                    "Aucune clé {} : ajoutez-la avec `mrc-poche keys set {} <clé>`.",
                    provider, provider
                );
            }
        }
        KeysAction::Forget { provider } => {
            let provider = parse_provider(&provider)?;
            keys.forget(provider);
            println!("Clé {} supprimée.", provider);
        }
    }

    Ok(())
}

fn parse_provider(name: &str) -> Result<Provider> {
    Provider::parse(name).ok_or_else(|| {
        anyhow::anyhow!("Fournisseur inconnu : {} (perplexity, stripe, youtube)", name)
    })
}

async fn run_ask(config: &AppConfig, question: String) -> Result<()> {
    let mut prefs = Preferences::open_default()?;
    prefs.push_screen("assistant");

    let keys = ApiKeyStore::open_default()?;
    let mut ledger = UsageLedger::open_default(config.effective_quotas())?;
    let state = probe_connectivity(config).await?;

    // UI-level gate: the live assistant stops at the quota, the canned
    // offline path does not count against it.
    if state.is_online() && ledger.get_remaining(usage::features::AI_QUESTIONS) == 0 {
        println!("Quota mensuel de questions atteint : réessayez le mois prochain.");
        return Ok(());
    }

    let question_clone = question.clone();
    let online = state.is_online();
    let result =
        tokio::task::spawn_blocking(move || assistant::ask(&keys, online, &question_clone))
            .await?;

    if result.needs_key {
        println!(
            "Aucune clé Perplexity configurée. Ajoutez-la avec `mrc-poche keys set perplexity \
             <clé>` pour activer l'assistant."
        );
        return Ok(());
    }

    if let Some(message) = result.error {
        println!("{}", message);
        return Ok(());
    }

    if let Some(answer) = result.answer {
        match answer.source {
            assistant::AnswerSource::Live => {
                ledger.record_use(usage::features::AI_QUESTIONS);
            }
            assistant::AnswerSource::Canned => {
                println!("(hors ligne — réponse issue du contenu local)\n");
            }
        }
        println!("{}", answer.text);
    }

    Ok(())
}
