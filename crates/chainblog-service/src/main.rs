use anyhow::{Context, Result};
use chainblog_aggregator::AggregationEngine;
use chainblog_chains::AlloyReader;
use chainblog_config::{Config, ConfigLoader};
use chainblog_registry::{ActiveNetworks, NetworkRegistry};
use chainblog_types::{Address, ChainId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "chainblog")]
#[command(about = "Multi-chain blog aggregator", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/networks.toml")]
	config: PathBuf,

	#[arg(long, env = "CHAINBLOG_LOG_LEVEL", default_value = "info")]
	log_level: String,

	/// Emit JSON instead of formatted text.
	#[arg(long, global = true)]
	json: bool,

	/// Hex private key for commands that send transactions.
	#[arg(
		long,
		env = "CHAINBLOG_PRIVATE_KEY",
		hide_env_values = true,
		global = true
	)]
	private_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// List configured networks and the default-active set
	Networks,
	/// Validate the configuration file
	Validate,
	/// Newest posts across the active chains
	Explore {
		#[arg(long, default_value_t = 1)]
		page: u64,
		#[arg(long)]
		size: Option<u64>,
		/// Chains to query, comma separated; defaults to the default-active set
		#[arg(long, value_delimiter = ',')]
		chains: Vec<ChainId>,
	},
	/// Newest posts with images, across the active chains that store them
	Gallery {
		#[arg(long, default_value_t = 1)]
		page: u64,
		#[arg(long)]
		size: Option<u64>,
		#[arg(long, value_delimiter = ',')]
		chains: Vec<ChainId>,
	},
	/// One author's posts on one chain, newest first
	History {
		address: Address,
		#[arg(long)]
		chain: ChainId,
		#[arg(long, default_value_t = 1)]
		page: u64,
		#[arg(long)]
		size: Option<u64>,
	},
	/// Fetch a single post by chain and id
	Show {
		#[arg(long)]
		chain: ChainId,
		id: u64,
	},
	/// Resolve a shared post link
	Link { url: String },
	/// Recently registered users on one chain
	Users {
		#[arg(long)]
		chain: ChainId,
		#[arg(long, default_value_t = 20)]
		limit: u64,
	},
	/// Register a username on a chain
	Register {
		username: String,
		#[arg(long)]
		chain: ChainId,
	},
	/// Publish a post on a chain
	Post {
		#[arg(long)]
		chain: ChainId,
		#[arg(long)]
		title: String,
		#[arg(long)]
		content: String,
		#[arg(long)]
		cover: Option<String>,
	},
	/// Edit an existing post
	Edit {
		#[arg(long)]
		chain: ChainId,
		id: u64,
		#[arg(long)]
		title: String,
		#[arg(long)]
		content: String,
		#[arg(long)]
		cover: Option<String>,
	},
	/// Delete a post
	Delete {
		#[arg(long)]
		chain: ChainId,
		id: u64,
	},
	/// Set or clear a user's banned flag (contract owner only)
	Ban {
		address: Address,
		#[arg(long)]
		chain: ChainId,
		/// Clear the flag instead of setting it
		#[arg(long)]
		unban: bool,
	},
}

/// Read-side wiring shared by every command.
struct App {
	config: Config,
	registry: Arc<NetworkRegistry>,
	reader: Arc<AlloyReader>,
	engine: AggregationEngine,
}

impl App {
	async fn load(config_path: &PathBuf) -> Result<Self> {
		let config = ConfigLoader::new()
			.with_file(config_path)
			.load()
			.await
			.context("Failed to load configuration")?;

		let registry = Arc::new(NetworkRegistry::new(
			config.descriptors().context("Invalid network entry")?,
		));
		let reader = Arc::new(AlloyReader::default());
		let engine = AggregationEngine::new(registry.clone(), reader.clone());

		Ok(Self {
			config,
			registry,
			reader,
			engine,
		})
	}

	/// Chains an aggregate view should query: an explicit selection, or the
	/// configured default-active set.
	async fn active_chains(&self, selected: Vec<ChainId>) -> Vec<ChainId> {
		if selected.is_empty() {
			ActiveNetworks::seeded(&self.registry).snapshot().await
		} else {
			selected
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match &cli.command {
		Commands::Networks => commands::networks(&App::load(&cli.config).await?, cli.json),
		Commands::Validate => {
			let app = App::load(&cli.config).await?;
			info!("Configuration is valid");
			info!(
				"{} networks, {} confirmations required",
				app.registry.len(),
				app.config.session.confirmations
			);
			Ok(())
		}
		Commands::Explore { page, size, chains } => {
			let app = App::load(&cli.config).await?;
			let chains = app.active_chains(chains.clone()).await;
			let size = size.unwrap_or(app.config.session.explore_page_size);
			commands::explore(&app, &chains, *page, size, cli.json).await
		}
		Commands::Gallery { page, size, chains } => {
			let app = App::load(&cli.config).await?;
			let chains = app.active_chains(chains.clone()).await;
			let size = size.unwrap_or(app.config.session.gallery_page_size);
			commands::gallery(&app, &chains, *page, size, cli.json).await
		}
		Commands::History {
			address,
			chain,
			page,
			size,
		} => {
			let app = App::load(&cli.config).await?;
			let size = size.unwrap_or(app.config.session.history_page_size);
			commands::history(&app, *address, *chain, *page, size, cli.json).await
		}
		Commands::Show { chain, id } => {
			commands::show(&App::load(&cli.config).await?, *chain, *id, cli.json).await
		}
		Commands::Link { url } => {
			commands::link(&App::load(&cli.config).await?, url, cli.json).await
		}
		Commands::Users { chain, limit } => {
			commands::users(&App::load(&cli.config).await?, *chain, *limit, cli.json).await
		}
		Commands::Register { username, chain } => {
			let app = App::load(&cli.config).await?;
			let session = commands::open_session(&app, &cli.private_key, *chain).await?;
			commands::register(&session, username).await
		}
		Commands::Post {
			chain,
			title,
			content,
			cover,
		} => {
			let app = App::load(&cli.config).await?;
			let session = commands::open_session(&app, &cli.private_key, *chain).await?;
			commands::create_post(&session, title, content, cover.clone()).await
		}
		Commands::Edit {
			chain,
			id,
			title,
			content,
			cover,
		} => {
			let app = App::load(&cli.config).await?;
			let session = commands::open_session(&app, &cli.private_key, *chain).await?;
			commands::update_post(&session, *chain, *id, title, content, cover.clone()).await
		}
		Commands::Delete { chain, id } => {
			let app = App::load(&cli.config).await?;
			let session = commands::open_session(&app, &cli.private_key, *chain).await?;
			commands::delete_post(&session, *chain, *id).await
		}
		Commands::Ban {
			address,
			chain,
			unban,
		} => {
			let app = App::load(&cli.config).await?;
			let session = commands::open_session(&app, &cli.private_key, *chain).await?;
			commands::set_banned(&session, *address, !unban).await
		}
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
