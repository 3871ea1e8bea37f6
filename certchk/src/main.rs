//! certchk: Command-line X.509 certificate path verifier.

use anyhow::{Context, Result};
use certchk_lib::{
    is_pem, CertificateRecord, CrlRecord, Profile, TrustStore, VerificationResult, VerifyOptions,
};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(
    name = "certchk",
    about = "Verify X.509 certificate paths against a cryptographic policy profile",
    long_about = "certchk builds a path from a certificate to a trust anchor and\n\
                  reports every policy, time, structural and revocation defect it\n\
                  finds as a set of flags instead of stopping at the first one.\n\n\
                  Input format (PEM vs DER) is auto-detected. Set RUST_LOG=debug to\n\
                  see path selection.",
    after_help = "EXAMPLES:\n\
                  \n  certchk verify --CAfile root.pem --untrusted int.pem leaf.pem\
                  \n  certchk verify --profile compat --name www.example.com chain.pem\
                  \n  certchk verify --json --attime 1700000000 leaf.pem\
                  \n  certchk stress --threads 8 --iterations 1000 leaf.pem\
                  \n  certchk checksum --chunk 4096 bundle.pem"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a certificate path (exit 0 = valid, 2 = fail)
    #[command(
        after_help = "LEAF is a PEM or DER certificate. A PEM file may carry the\n\
                      intermediates after the leaf. Uses the system trust store unless\n\
                      --CAfile or --CApath is given.\n\
                      \nPROFILES:\n\
                      \n  modern      SHA-2 family, RSA >= 2048 (default)\
                      \n  compat      modern plus SHA-1\
                      \n  next        SHA-256 and up\
                      \n  suiteb      ECDSA P-256/SHA-256 or P-384/SHA-384"
    )]
    Verify {
        /// Certificate file (PEM or DER). Reads from stdin if omitted.
        leaf: Option<PathBuf>,
        #[command(flatten)]
        settings: VerifySettings,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Display subject, issuer and flags for each certificate on the path
        #[arg(long)]
        show_chain: bool,
    },
    /// Verify certificates repeatedly from many threads and compare results
    /// (exit 0 = all identical, 2 = divergence)
    Stress {
        /// Certificate files (PEM or DER)
        #[arg(required = true)]
        leaves: Vec<PathBuf>,
        #[command(flatten)]
        settings: VerifySettings,
        /// Worker threads
        #[arg(long, default_value_t = 4, value_name = "N")]
        threads: usize,
        /// Verifications per thread
        #[arg(long, default_value_t = 100, value_name = "M")]
        iterations: usize,
    },
    /// Print the CRC-32 of a file
    Checksum {
        /// Input file. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Feed the accumulator in chunks of N bytes
        #[arg(long, value_name = "N")]
        chunk: Option<usize>,
    },
}

/// Inputs shared by every subcommand that runs a verification.
#[derive(Args, Clone, Debug)]
struct VerifySettings {
    /// PEM file with untrusted intermediate certificates
    #[arg(long, value_name = "FILE")]
    untrusted: Option<PathBuf>,
    /// PEM file containing trusted CA certificates (default: system trust store)
    #[arg(long = "CAfile", visible_alias = "ca-file", value_name = "FILE")]
    ca_file: Option<PathBuf>,
    /// Directory of trusted CA certificates in PEM format
    #[arg(long = "CApath", visible_alias = "ca-path", value_name = "DIR")]
    ca_path: Option<PathBuf>,
    /// PEM or DER file containing CRL(s) for revocation checking
    #[arg(long = "CRLfile", visible_alias = "crl-file", value_name = "FILE")]
    crl_file: Option<PathBuf>,
    /// Built-in profile: modern, compat, next, suiteb
    #[arg(long, default_value = "modern", value_name = "NAME")]
    profile: String,
    /// JSON profile definition (overrides --profile)
    #[arg(long, value_name = "JSON", conflicts_with = "profile")]
    profile_file: Option<PathBuf>,
    /// Host name the leaf must match (SAN DNS names, else CN)
    #[arg(long, value_name = "HOST")]
    name: Option<String>,
    /// Verify at a specific Unix timestamp instead of current time
    #[arg(long, value_name = "EPOCH")]
    attime: Option<i64>,
    /// Maximum path length, leaf and anchor included
    #[arg(long, value_name = "N")]
    verify_depth: Option<usize>,
}

/// Maximum file size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => read_file(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat file: {}", path.display()))?;
    if meta.len() > MAX_INPUT_BYTES {
        anyhow::bail!(
            "File too large ({} bytes, max {} bytes): {}",
            meta.len(),
            MAX_INPUT_BYTES,
            path.display()
        );
    }
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Decode every certificate in `input`: a PEM bundle or a single DER
/// certificate.
fn load_certificates(input: &[u8]) -> Result<Vec<CertificateRecord>> {
    if is_pem(input) {
        Ok(certchk_lib::parse_pem_chain(input)?)
    } else {
        Ok(vec![certchk_lib::parse_der(input)?])
    }
}

fn load_crls(input: &[u8]) -> Result<Vec<CrlRecord>> {
    if is_pem(input) {
        Ok(certchk_lib::parse_pem_crls(input)?)
    } else {
        Ok(vec![certchk_lib::parse_der_crl(input)?])
    }
}

fn load_profile(settings: &VerifySettings) -> Result<Profile> {
    match settings.profile_file.as_ref() {
        Some(path) => Profile::from_json_file(path)
            .with_context(|| format!("Failed to load profile: {}", path.display())),
        None => Ok(Profile::by_name(&settings.profile)?),
    }
}

fn load_trust_store(settings: &VerifySettings) -> Result<TrustStore> {
    if settings.ca_file.is_none() && settings.ca_path.is_none() {
        return TrustStore::system().context("Failed to load system trust store");
    }
    let mut store = TrustStore::new();
    if let Some(path) = settings.ca_file.as_ref() {
        let data = read_file(path)?;
        let added = store
            .add_pem_bundle(&data)
            .with_context(|| format!("Failed to parse CA file: {}", path.display()))?;
        debug!("{} anchors from {}", added, path.display());
    }
    if let Some(dir) = settings.ca_path.as_ref() {
        let added = store
            .add_pem_directory(dir)
            .with_context(|| format!("Failed to read CA directory: {}", dir.display()))?;
        debug!("{} anchors from {}", added, dir.display());
    }
    if store.is_empty() {
        anyhow::bail!("trust store is empty");
    }
    Ok(store)
}

/// Everything one verification borrows, loaded once and shared by
/// every call.
struct Inputs {
    store: TrustStore,
    untrusted: Vec<CertificateRecord>,
    crls: Vec<CrlRecord>,
    profile: Profile,
}

impl Inputs {
    fn load(settings: &VerifySettings) -> Result<Self> {
        let untrusted = match settings.untrusted.as_ref() {
            Some(path) => load_certificates(&read_file(path)?)
                .with_context(|| format!("Failed to parse untrusted file: {}", path.display()))?,
            None => Vec::new(),
        };
        let crls = match settings.crl_file.as_ref() {
            Some(path) => load_crls(&read_file(path)?)
                .with_context(|| format!("Failed to parse CRL file: {}", path.display()))?,
            None => Vec::new(),
        };
        Ok(Inputs {
            store: load_trust_store(settings)?,
            untrusted,
            crls,
            profile: load_profile(settings)?,
        })
    }

    fn options<'a>(&'a self, settings: &'a VerifySettings) -> VerifyOptions<'a> {
        let mut options = VerifyOptions {
            at_time: settings.attime,
            crls: &self.crls,
            expected_name: settings.name.as_deref(),
            ..Default::default()
        };
        if let Some(depth) = settings.verify_depth {
            options.max_depth = depth;
        }
        options
    }
}

/// `settings` with `attime` fixed to the current time when it was not
/// given, so every run of a stress batch sees the same instant.
fn with_pinned_time(settings: &VerifySettings) -> Result<VerifySettings> {
    let mut pinned = settings.clone();
    if pinned.attime.is_none() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?;
        pinned.attime = Some(i64::try_from(now.as_secs()).context("System clock out of range")?);
        debug!("stress runs pinned to {}", now.as_secs());
    }
    Ok(pinned)
}

/// Split a decoded input file into the leaf and the intermediates that
/// followed it, appending them to the shared pool.
fn split_leaf(
    mut certs: Vec<CertificateRecord>,
    pool: &[CertificateRecord],
) -> Result<(CertificateRecord, Vec<CertificateRecord>)> {
    if certs.is_empty() {
        anyhow::bail!("no certificate to verify");
    }
    let leaf = certs.remove(0);
    certs.extend(pool.iter().cloned());
    Ok((leaf, certs))
}

fn verify_one(
    leaf: &CertificateRecord,
    intermediates: &[CertificateRecord],
    inputs: &Inputs,
    settings: &VerifySettings,
) -> Result<VerificationResult> {
    let options = inputs.options(settings);
    Ok(certchk_lib::verify_certificate_with_options(
        leaf,
        intermediates,
        &inputs.store,
        &inputs.profile,
        &options,
    )?)
}

fn print_verify_result(
    label: &str,
    result: &VerificationResult,
    json: bool,
    show_chain: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    if result.is_valid() {
        println!("{}: {}", label, result);
    } else {
        eprintln!("{}: {}", label, result);
    }
    if show_chain {
        for info in &result.chain {
            let anchor = if info.trust_anchor { " (anchor)" } else { "" };
            println!(
                "depth {}: subject = {}, issuer = {}, flags = {}{}",
                info.depth, info.subject, info.issuer, info.flags, anchor
            );
        }
    }
    Ok(())
}

/// Run `threads * iterations` verifications on a dedicated pool and count
/// the results that differ from `baseline`.
fn stress_one<F>(
    threads: usize,
    iterations: usize,
    baseline: &VerificationResult,
    verify: F,
) -> Result<usize>
where
    F: Fn() -> Result<VerificationResult> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to start worker pool")?;
    let total = threads.saturating_mul(iterations);
    pool.install(|| {
        (0..total)
            .into_par_iter()
            .map(|_| verify().map(|r| usize::from(&r != baseline)))
            .sum::<Result<usize>>()
    })
}

fn checksum_of(data: &[u8], chunk: Option<usize>) -> Result<u32> {
    match chunk {
        Some(0) => anyhow::bail!("--chunk must be at least 1"),
        Some(n) => Ok(data.chunks(n).fold(
            certchk_lib::checksum::INITIAL_STATE,
            certchk_lib::checksum::update,
        )),
        None => Ok(certchk_lib::checksum::of(data)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Verify {
            leaf,
            settings,
            json,
            show_chain,
        } => {
            let inputs = Inputs::load(settings)?;
            let input = read_input(leaf.as_ref())?;
            let label = leaf
                .as_ref()
                .map_or("stdin".to_string(), |f| f.display().to_string());
            let (subject, intermediates) =
                split_leaf(load_certificates(&input)?, &inputs.untrusted)?;

            let result = verify_one(&subject, &intermediates, &inputs, settings)?;
            print_verify_result(&label, &result, *json, *show_chain)?;
            if !result.is_valid() {
                std::process::exit(2);
            }
        }
        Commands::Stress {
            leaves,
            settings,
            threads,
            iterations,
        } => {
            if *threads == 0 || *iterations == 0 {
                anyhow::bail!("--threads and --iterations must be at least 1");
            }
            let settings = &with_pinned_time(settings)?;
            let inputs = Inputs::load(settings)?;
            let mut divergent = 0usize;
            for path in leaves {
                let label = path.display().to_string();
                let (subject, intermediates) =
                    split_leaf(load_certificates(&read_file(path)?)?, &inputs.untrusted)?;
                let verify = || verify_one(&subject, &intermediates, &inputs, settings);
                let baseline = verify()?;
                info!("{}: baseline {}", label, baseline);
                let differing = stress_one(*threads, *iterations, &baseline, verify)?;
                let total = threads.saturating_mul(*iterations);
                if differing == 0 {
                    println!("{}: {} runs identical, {}", label, total, baseline);
                } else {
                    eprintln!(
                        "{}: {} of {} runs differ from {}",
                        label, differing, total, baseline
                    );
                    divergent += 1;
                }
            }
            if divergent > 0 {
                std::process::exit(2);
            }
        }
        Commands::Checksum { file, chunk } => {
            let data = read_input(file.as_ref())?;
            let label = file
                .as_ref()
                .map_or("-".to_string(), |f| f.display().to_string());
            println!("{:08x}  {}", checksum_of(&data, *chunk)?, label);
        }
    }

    Ok(())
}
