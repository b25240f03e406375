//! keygate cli
//!
//! splits and recombines keys, evaluates policies, and runs the full
//! two-gate release in memory.
//!
//! ## usage
//!
//! ```bash
//! # split a 32-byte key into 7 shares, any 4 recover it
//! keygate split --secret 00ab..ff -k 4 -n 7
//!
//! # recombine
//! keygate combine -k 4 <share> <share> <share> <share>
//!
//! # check attributes against a policy
//! keygate policy --policy "role:doctor AND dept:cardiology" --attr role:doctor --attr department:cardiology
//!
//! # simulate a release request
//! keygate simulate --config keygate.toml --policy role:admin --attr role:admin \
//!     --voter authority-1 --voter authority-2 --voter authority-3 --voter authority-4
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn};

use keygate::{
    AttributeSet, Config, Custody, DenialReason, KeyRelease, Policy, QuorumState, QuorumTracker,
    RequestId, SecretKey, SecretSource, Share,
};

#[derive(Parser)]
#[command(name = "keygate")]
#[command(about = "two-gate key release: attribute policy plus k-of-n approvals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// how the simulated key is held
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum Mode {
    /// key stored whole, approvals gate it
    Approval,
    /// key split among the authorities, approvers' shares rebuild it
    Shared,
}

/// share text encoding
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum Encoding {
    Hex,
    Base64,
}

#[derive(Subcommand)]
enum Commands {
    /// split a 32-byte secret into shares
    Split {
        /// secret as 64 hex chars
        #[arg(short, long)]
        secret: String,

        /// shares needed to recover
        #[arg(short = 'k', long = "threshold")]
        threshold: usize,

        /// shares to produce
        #[arg(short = 'n', long = "shares")]
        shares: usize,

        /// output encoding
        #[arg(short, long, value_enum, default_value = "hex")]
        encoding: Encoding,
    },

    /// recover a secret from shares (hex or base64)
    Combine {
        /// shares needed to recover
        #[arg(short = 'k', long = "threshold")]
        threshold: usize,

        /// encoded shares
        #[arg(required = true)]
        shares: Vec<String>,
    },

    /// evaluate attributes against a policy
    Policy {
        /// policy, e.g. "role:doctor AND dept:cardiology"
        #[arg(short, long)]
        policy: String,

        /// requester attribute as key:value, repeatable
        #[arg(short, long = "attr")]
        attrs: Vec<String>,
    },

    /// run a release request end to end in memory
    Simulate {
        /// config file (default: 4-of-7 with authority-1..authority-7)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// file policy
        #[arg(short, long)]
        policy: String,

        /// requester attribute as key:value, repeatable
        #[arg(short, long = "attr")]
        attrs: Vec<String>,

        /// approving authority, repeatable
        #[arg(long = "voter")]
        voters: Vec<String>,

        /// request id
        #[arg(short, long, default_value = "r1")]
        request: String,

        /// how the key is held
        #[arg(short, long, value_enum, default_value = "shared")]
        mode: Mode,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(format!("keygate={},keygate_cli={}", level, level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Split {
            secret,
            threshold,
            shares,
            encoding,
        } => run_split(secret, threshold, shares, encoding),
        Commands::Combine { threshold, shares } => run_combine(threshold, shares),
        Commands::Policy { policy, attrs } => run_policy(policy, attrs),
        Commands::Simulate {
            config,
            policy,
            attrs,
            voters,
            request,
            mode,
        } => run_simulate(config, policy, attrs, voters, request, mode),
    }
}

fn run_split(secret: String, threshold: usize, shares: usize, encoding: Encoding) -> Result<()> {
    let secret = SecretKey::from_hex(&secret).context("secret must be 32 bytes of hex")?;
    let shares = keygate::split_secret(&secret, threshold, shares)
        .with_context(|| format!("splitting into {}-of-{}", threshold, shares))?;

    info!("split into {} shares, {} needed", shares.len(), threshold);
    for share in &shares {
        match encoding {
            Encoding::Hex => println!("{}", share.to_hex()),
            Encoding::Base64 => println!("{}", share.to_base64()),
        }
    }
    Ok(())
}

fn parse_share(s: &str) -> Result<Share> {
    Share::from_hex(s)
        .or_else(|_| Share::from_base64(s))
        .with_context(|| format!("not a valid share: {}", s))
}

fn run_combine(threshold: usize, shares: Vec<String>) -> Result<()> {
    let shares = shares
        .iter()
        .map(|s| parse_share(s))
        .collect::<Result<Vec<_>>>()?;

    debug!("combining {} shares with threshold {}", shares.len(), threshold);
    let secret = keygate::reconstruct_secret(&shares, threshold).context("reconstruction failed")?;
    println!("{}", secret.to_hex());
    Ok(())
}

fn run_policy(policy: String, attrs: Vec<String>) -> Result<()> {
    let attributes = AttributeSet::from_tokens(&attrs);
    let satisfied = keygate::satisfies(&policy, &attributes);

    println!("satisfied: {}", satisfied);
    match Policy::parse(&policy) {
        Ok(parsed) => println!("required keys: {}", parsed.required_keys().join(", ")),
        Err(e) => println!("invalid policy: {}", e),
    }
    Ok(())
}

#[derive(Serialize)]
struct SimulationReport {
    request_id: String,
    strategy: String,
    authorized: bool,
    reason: Option<DenialReason>,
    quorum: QuorumState,
    approvers: Vec<String>,
    rejected_voters: Vec<String>,
    key_matches: bool,
}

fn run_simulate(
    config: Option<PathBuf>,
    policy: String,
    attrs: Vec<String>,
    voters: Vec<String>,
    request: String,
    mode: Mode,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let quorum = QuorumTracker::new(&config.quorum)?;
    let release = match mode {
        Mode::Approval => KeyRelease::approval(quorum),
        Mode::Shared => KeyRelease::shared(quorum, config.sharing.threshold)?,
    };

    let request_id = RequestId::new(request);
    let mut rejected_voters = Vec::new();
    for voter in &voters {
        match release.quorum().cast_vote(&request_id, voter) {
            Ok(outcome) => debug!(voter = %voter, count = outcome.count(), "vote cast"),
            Err(keygate::Error::UnauthorizedVoter(v)) => rejected_voters.push(v),
            Err(e) => return Err(e.into()),
        }
    }

    let key = SecretKey::generate();
    let custody;
    let source = match mode {
        Mode::Approval => SecretSource::Stored(SecretKey::from_bytes(*key.as_bytes())),
        Mode::Shared => {
            if config.sharing.shares != config.quorum.authorities.len() {
                warn!(
                    "sharing.shares = {} but {} authorities hold shares; one share each",
                    config.sharing.shares,
                    config.quorum.authorities.len()
                );
            }
            custody = Custody::split(&key, config.sharing.threshold, &config.quorum.authorities)
                .context("distributing shares to authorities")?;
            SecretSource::Custody(&custody)
        }
    };

    let attributes = AttributeSet::from_tokens(&attrs);
    let decision = release.authorize_and_release(&policy, &attributes, &request_id, source)?;

    let report = SimulationReport {
        request_id: request_id.to_string(),
        strategy: release.strategy().to_string(),
        authorized: decision.authorized,
        reason: decision.reason,
        quorum: release.quorum().status(&request_id)?,
        approvers: release.quorum().approvers(&request_id)?,
        rejected_voters,
        key_matches: decision.secret.as_ref().is_some_and(|s| *s == key),
    };

    if decision.authorized && !report.key_matches {
        bail!("released key does not match the protected key");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
