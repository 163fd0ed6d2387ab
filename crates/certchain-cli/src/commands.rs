//! # Subcommands
//!
//! `address` and `commit` are pure: they read a file and print. The other
//! subcommands operate on the workspace data directory.
//!
//! Exit codes: `0` success, `1` error, `2` verification mismatch,
//! `3` verification unresolvable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use certchain_core::{CertificateId, MetadataDraft, OwnerAddress, Timestamp};
use certchain_crypto::address_of;
use certchain_registry::{
    qr_svg, share_link, CertificateRecord, UploadRequest, VerificationOutcome, WalletSession,
};
use certchain_zkp::{encode_commitment_input, BackendKind};

use crate::workspace::Workspace;

/// Metadata fields, optionally seeded from a YAML or JSON file.
#[derive(Args, Debug, Default, Clone)]
pub struct MetadataArgs {
    /// YAML or JSON file with camelCase metadata fields.
    #[arg(long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,
    /// Certificate title.
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Recipient name.
    #[arg(long)]
    pub issued_to: Option<String>,
    #[arg(long)]
    pub issuer_id: Option<String>,
    #[arg(long)]
    pub issuer_name: Option<String>,
    /// Issue date, YYYY-MM-DD. Defaults to today (UTC).
    #[arg(long)]
    pub issue_date: Option<String>,
    /// Expiry date, YYYY-MM-DD.
    #[arg(long)]
    pub expiry_date: Option<String>,
}

impl MetadataArgs {
    /// Merge the metadata file with the flags. Flags win.
    pub fn draft(&self) -> Result<MetadataDraft> {
        let mut draft: MetadataDraft = match &self.metadata {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read metadata: {}", path.display()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("failed to parse metadata: {}", path.display()))?
            }
            None => MetadataDraft::default(),
        };
        let overrides = [
            (&mut draft.name, &self.name),
            (&mut draft.description, &self.description),
            (&mut draft.issued_to, &self.issued_to),
            (&mut draft.issuer_id, &self.issuer_id),
            (&mut draft.issuer_name, &self.issuer_name),
            (&mut draft.issue_date, &self.issue_date),
            (&mut draft.expiry_date, &self.expiry_date),
        ];
        for (field, flag) in overrides {
            if flag.is_some() {
                field.clone_from(flag);
            }
        }
        Ok(draft)
    }
}

/// Wallet identity for owner-gated commands.
#[derive(Args, Debug, Clone)]
pub struct OwnerArgs {
    /// Wallet address acting as owner.
    #[arg(long)]
    pub owner: String,
    /// Chain id of the connected wallet.
    #[arg(long, default_value_t = 1)]
    pub chain_id: u64,
}

impl OwnerArgs {
    pub fn session(&self) -> Result<WalletSession> {
        Ok(WalletSession::new(OwnerAddress::new(&self.owner)?, self.chain_id))
    }
}

#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Certificate file.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Certificate file.
    pub file: PathBuf,
    #[command(flatten)]
    pub meta: MetadataArgs,
    /// Commitment timestamp (RFC 3339, UTC, Z suffix). Defaults to now.
    #[arg(long)]
    pub timestamp: Option<String>,
    /// Backend override.
    #[arg(long)]
    pub backend: Option<BackendKind>,
    /// Also print the canonical commitment input.
    #[arg(long)]
    pub show_input: bool,
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Certificate file (PDF or image).
    pub file: PathBuf,
    #[command(flatten)]
    pub owner: OwnerArgs,
    #[command(flatten)]
    pub meta: MetadataArgs,
    /// MIME type. Inferred from the file extension when absent.
    #[arg(long)]
    pub mime: Option<String>,
    /// Stop after upload, leaving a draft.
    #[arg(long)]
    pub no_publish: bool,
    /// Publish but do not wait for ledger confirmation.
    #[arg(long)]
    pub no_confirm: bool,
}

#[derive(Args, Debug)]
pub struct OwnedIdArgs {
    /// Certificate id.
    pub id: String,
    #[command(flatten)]
    pub owner: OwnerArgs,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Certificate id.
    pub id: String,
    /// Print the full record as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,
    /// Print records as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Certificate id.
    pub id: String,
    /// Write an SVG QR code of the link to this file.
    #[arg(long, value_name = "FILE")]
    pub qr: Option<PathBuf>,
}

/// MIME type for a certificate file, by extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))
}

fn parse_id(s: &str) -> Result<CertificateId> {
    Ok(CertificateId::parse(s)?)
}

fn print_record(record: &CertificateRecord, origin: &str) -> Result<()> {
    println!("id:          {}", record.id);
    println!("name:        {}", record.metadata.name);
    println!("issued to:   {}", record.metadata.issued_to);
    println!("issuer:      {} ({})", record.metadata.issuer_name, record.metadata.issuer_id);
    println!("issue date:  {}", record.metadata.issue_date);
    if let Some(expiry) = &record.metadata.expiry_date {
        println!("expiry date: {expiry}");
    }
    println!("status:      {}", record.state());
    println!("owner:       {}", record.owner);
    println!("content id:  {}", record.content_id);
    println!("locator:     {}", record.locator);
    println!("commitment:  {}", record.commitment);
    if let Some(reference) = &record.ledger_reference {
        println!("reference:   {reference}");
    }
    println!("link:        {}", share_link(origin, &record.id)?);
    Ok(())
}

// ── pure commands ────────────────────────────────────────────────────

pub fn run_address(args: &AddressArgs) -> Result<u8> {
    let id = address_of(&read_file(&args.file)?)?;
    println!("{id}");
    Ok(0)
}

pub fn run_commit(args: &CommitArgs, default_backend: BackendKind) -> Result<u8> {
    let content_id = address_of(&read_file(&args.file)?)?;
    let timestamp = match &args.timestamp {
        Some(t) => Timestamp::parse(t)?,
        None => Timestamp::now(),
    };
    let metadata = args.meta.draft()?.complete(timestamp.date())?;
    let backend = args.backend.unwrap_or(default_backend).build();
    let commitment = backend.compress(&metadata, &content_id, &timestamp)?;

    if args.show_input {
        let input = encode_commitment_input(&metadata, &content_id, &timestamp)?;
        println!("input:      {}", String::from_utf8_lossy(input.as_bytes()));
    }
    println!("content id: {content_id}");
    println!("timestamp:  {timestamp}");
    println!("commitment: {commitment}");
    Ok(0)
}

// ── workspace commands ───────────────────────────────────────────────

pub async fn run_issue(ws: &Workspace, args: &IssueArgs) -> Result<u8> {
    let session = args.owner.session()?;
    let mime = args
        .mime
        .clone()
        .unwrap_or_else(|| mime_for(&args.file).to_string());
    let request = UploadRequest {
        bytes: read_file(&args.file)?,
        mime_type: mime,
        metadata: args.meta.draft()?,
    };

    let mut record = ws.service.upload(&session, request).await?;
    if !args.no_publish {
        record = ws.service.publish(&session, record.id).await?;
        if !args.no_confirm {
            record = ws.service.confirm(&session, record.id).await?;
        }
    }
    print_record(&record, &ws.config.origin)?;
    Ok(0)
}

pub async fn run_publish(ws: &Workspace, args: &OwnedIdArgs) -> Result<u8> {
    let record = ws
        .service
        .publish(&args.owner.session()?, parse_id(&args.id)?)
        .await?;
    print_record(&record, &ws.config.origin)?;
    Ok(0)
}

pub async fn run_confirm(ws: &Workspace, args: &OwnedIdArgs) -> Result<u8> {
    let record = ws
        .service
        .confirm(&args.owner.session()?, parse_id(&args.id)?)
        .await?;
    print_record(&record, &ws.config.origin)?;
    Ok(0)
}

pub async fn run_verify(ws: &Workspace, args: &IdArgs) -> Result<u8> {
    let report = ws.service.verify(parse_id(&args.id)?).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("outcome: {}", report.outcome);
        println!("status:  {}", report.status);
    }
    Ok(match report.outcome {
        VerificationOutcome::Verified => 0,
        VerificationOutcome::Mismatch { .. } => 2,
        VerificationOutcome::Unresolvable { .. } => 3,
    })
}

pub async fn run_status(ws: &Workspace, args: &IdArgs) -> Result<u8> {
    let record = ws.service.get(parse_id(&args.id)?).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record, &ws.config.origin)?;
    }
    Ok(0)
}

pub async fn run_list(ws: &Workspace, args: &ListArgs) -> Result<u8> {
    let records = ws.service.list_by_owner(&args.owner.session()?).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(0);
    }
    if records.is_empty() {
        println!("no certificates for {}", args.owner.owner);
    }
    for r in &records {
        println!(
            "{}  {:<9}  {}  {}",
            r.id,
            r.state().to_string(),
            r.metadata.issue_date,
            r.metadata.name
        );
    }
    Ok(0)
}

pub async fn run_link(ws: &Workspace, args: &LinkArgs) -> Result<u8> {
    let record = ws.service.get(parse_id(&args.id)?).await?;
    let link = share_link(&ws.config.origin, &record.id)?;
    println!("{link}");
    if let Some(path) = &args.qr {
        std::fs::write(path, qr_svg(&link)?)
            .with_context(|| format!("failed to write QR code: {}", path.display()))?;
        tracing::info!(path = %path.display(), "QR code written");
    }
    Ok(0)
}
