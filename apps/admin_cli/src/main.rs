use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    access::{self, can, can_edit, can_view},
    attachments::AttachmentUpload,
    labels::{translate_grant, translate_resource_type, DisplayLabel},
    DashboardClient, OrderedCollection, OrderedCollectionSync, PersistReport, Session,
};
use shared::{
    domain::{Grant, ItemId, ProjectId, ResourceType},
    protocol::OrderableItem,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "admin-cli", about = "Operator console for the dashboard backend")]
struct Cli {
    #[arg(long, default_value = "admin.toml")]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the authenticated user.
    Whoami,
    /// Evaluate one grant, e.g. `can projects update --owner`.
    Can {
        resource: String,
        grant: String,
        /// Treat the target as owned by the current user.
        #[arg(long)]
        owner: bool,
    },
    /// Print the full grant matrix of the current user.
    Grants,
    /// List an ordered collection, e.g. `checklist:12`.
    List { collection: OrderedCollection },
    /// Move the item at SOURCE to DESTINATION (zero-based).
    Reorder {
        collection: OrderedCollection,
        source: usize,
        destination: usize,
    },
    /// Delete an item and close the gap it leaves.
    Delete { collection: OrderedCollection, id: i64 },
    /// Upload a file as the last attachment of a project.
    Upload {
        project_id: i64,
        path: PathBuf,
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config);
    if let Some(v) = cli.api_url {
        settings.api_url = v;
    }
    if let Some(v) = cli.token {
        settings.token = Some(v);
    }
    if let Some(v) = cli.email {
        settings.email = Some(v);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = Arc::new(
        DashboardClient::new(&settings.api_url)
            .with_context(|| format!("invalid api url '{}'", settings.api_url))?,
    );
    let session = match (&settings.token, &settings.email, &settings.password) {
        (Some(token), _, _) => client
            .restore(token.clone())
            .await
            .context("failed to restore session from token")?,
        (None, Some(email), Some(password)) => client
            .login(email, password)
            .await
            .context("login failed")?,
        _ => bail!("no credentials: configure a token, or an email plus ADMIN_PASSWORD"),
    };

    match cli.command {
        Command::Whoami => {
            let user = session.user();
            println!("{} <{}> (id {})", user.name, user.email, user.id);
            println!("session since {}", session.established_at().to_rfc3339());
        }
        Command::Can {
            resource,
            grant,
            owner,
        } => {
            let allowed = match (resource.parse::<ResourceType>(), grant.as_str()) {
                (Ok(resource), "update") if owner => can_edit(&session, resource, true),
                (Ok(resource), "view") if owner => can_view(&session, resource, true),
                _ => can(&session, &resource, &grant),
            };
            println!(
                "{} / {}: {}",
                translate_resource_type(&resource),
                translate_grant(&grant),
                if allowed { "permitido" } else { "negado" }
            );
        }
        Command::Grants => print_grant_matrix(&session),
        Command::List { collection } => {
            let sync = OrderedCollectionSync::new(Arc::clone(&client), collection);
            print_items(&sync.refresh().await?);
        }
        Command::Reorder {
            collection,
            source,
            destination,
        } => {
            access::require(&session, collection.resource_type(), Grant::Update)?;
            let sync = OrderedCollectionSync::new(Arc::clone(&client), collection);
            sync.refresh().await?;
            let report = sync.reorder(source, Some(destination)).await?;
            report_writes(&collection, &report);
            print_items(&sync.items().await);
        }
        Command::Delete { collection, id } => {
            access::require(&session, collection.resource_type(), Grant::Update)?;
            let sync = OrderedCollectionSync::new(Arc::clone(&client), collection);
            sync.refresh().await?;
            let report = sync.delete(ItemId(id)).await?;
            report_writes(&collection, &report);
            print_items(&sync.items().await);
        }
        Command::Upload {
            project_id,
            path,
            description,
        } => {
            access::require(&session, ResourceType::Projects, Grant::Update)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .context("upload path has no file name")?;
            let mime_type = mime_guess::from_path(&path).first().map(|m| m.to_string());

            let collection = OrderedCollection::ProjectAttachments(ProjectId(project_id));
            let sync = OrderedCollectionSync::new(Arc::clone(&client), collection);
            sync.refresh().await?;
            let stored = sync
                .upload_attachment(AttachmentUpload {
                    filename,
                    mime_type,
                    description,
                    bytes,
                })
                .await?;
            info!(item_id = stored.id.0, order = stored.order, "upload complete");
            print_items(&sync.items().await);
        }
    }

    Ok(())
}

fn print_grant_matrix(session: &Session) {
    print!("{:<16}", "");
    for grant in Grant::ALL {
        print!("{:>20}", grant.label());
    }
    println!();
    for resource in ResourceType::ALL {
        print!("{:<16}", resource.label());
        for grant in Grant::ALL {
            let mark = if session.can(resource, grant) { "x" } else { "-" };
            print!("{mark:>20}");
        }
        println!();
    }
}

fn print_items(items: &[OrderableItem]) {
    for item in items {
        let label = item
            .fields
            .get("name")
            .or_else(|| item.fields.get("description"))
            .and_then(|value| value.as_str())
            .unwrap_or_default();
        println!("{:>3}  #{:<6} {label}", item.order, item.id.0);
    }
}

fn report_writes(collection: &OrderedCollection, report: &PersistReport) {
    if report.is_complete() {
        return;
    }
    eprintln!(
        "{} of {} position updates failed on {collection}; the list below is what the server holds",
        report.failures.len(),
        report.attempted
    );
}
