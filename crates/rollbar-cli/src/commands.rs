//! Command handlers

use crate::{time, ItemsArgs};
use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use colored::Colorize;
use rollbar_api::{InstancesOptions, ItemsOptions, RollbarClient};
use rollbar_core::{Config, ConfigEnv, Instance, Item, ItemSort, ItemStatus, LOCAL_CONFIG_FILE};
use rollbar_output::{
    new_formatter, CompactFormatter, Format, Formatter, JsonFormatter, MarkdownFormatter,
};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Occurrences in a context report when zero is requested
const DEFAULT_CONTEXT_OCCURRENCES: usize = 3;

/// Resolved global settings shared by every command
pub struct App {
    pub config: Config,
    pub env: ConfigEnv,
    /// `--config`, when given
    pub config_path: Option<PathBuf>,
    pub format: Format,
    pub color: bool,
    pub quiet: bool,
}

impl App {
    fn client(&self) -> Result<RollbarClient> {
        self.config.validate()?;
        Ok(RollbarClient::new(&self.config.access_token)?)
    }

    fn formatter(&self) -> Box<dyn Formatter> {
        new_formatter(self.format, self.color)
    }

    /// Context reports are Markdown unless JSON or compact output was asked for
    fn context_formatter(&self) -> Box<dyn Formatter> {
        match self.format {
            Format::Json => Box::new(JsonFormatter::new()),
            Format::Compact => Box::new(CompactFormatter::new()),
            Format::Table | Format::Markdown => Box::new(MarkdownFormatter::new()),
        }
    }

    /// Target of `config set` and `init`
    fn local_config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| self.env.cwd.join(LOCAL_CONFIG_FILE))
    }

    fn notice(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}

pub async fn items(app: &App, args: ItemsArgs) -> Result<()> {
    let client = app.client()?;
    let now = Utc::now();

    let mut opts = ItemsOptions {
        status: status_filter(&args.status),
        level: args.level.unwrap_or_default(),
        environment: args
            .env
            .filter(|env| !env.is_empty())
            .unwrap_or_else(|| app.config.default_environment.clone()),
        query: args.query.unwrap_or_default(),
        page: args.page,
        ..Default::default()
    };

    if let Some(since) = &args.since {
        opts.date_from = Some(time::parse_since(since, now).context("invalid --since value")?);
    }
    if let Some(from) = &args.from {
        opts.date_from = Some(time::parse_time(from).context("invalid --from value")?);
    }
    if let Some(to) = &args.to {
        opts.date_to = Some(time::parse_time(to).context("invalid --to value")?);
    }

    let mut items = client.list_items(&opts).await?;
    ItemSort::parse_lenient(&args.sort).apply(&mut items);
    if args.limit > 0 {
        items.truncate(args.limit);
    }
    debug!("Rendering {} items", items.len());

    let mut out = io::stdout().lock();
    app.formatter().format_items(&mut out, &items)?;
    Ok(())
}

/// `any` lifts the status filter
fn status_filter(status: &str) -> Option<ItemStatus> {
    match status.trim().to_lowercase().as_str() {
        "" | "any" => None,
        other => Some(ItemStatus::from(other)),
    }
}

pub async fn item(
    app: &App,
    counter: Option<i64>,
    uuid: Option<i64>,
    occurrences: usize,
    context: bool,
) -> Result<()> {
    let client = app.client()?;
    let item = match (uuid, counter) {
        (Some(id), _) => client.get_item(id).await?,
        (None, Some(counter)) => client.get_item_by_counter(counter).await?,
        (None, None) => bail!("requires item counter argument or --uuid flag"),
    };

    if context || occurrences > 0 {
        let mut instances = item_instances(&client, &item).await?;
        if occurrences > 0 {
            instances.truncate(occurrences);
        }
        let mut out = io::stdout().lock();
        app.formatter().format_context(&mut out, &item, &instances)?;
        return Ok(());
    }

    let mut out = io::stdout().lock();
    app.formatter().format_item(&mut out, &item)?;
    Ok(())
}

async fn item_instances(client: &RollbarClient, item: &Item) -> Result<Vec<Instance>> {
    let instances = client
        .list_instances(&InstancesOptions {
            item_id: Some(item.id),
            page: 0,
        })
        .await?;
    Ok(instances)
}

pub async fn occurrences(
    app: &App,
    item: Option<i64>,
    all: bool,
    since: Option<String>,
    limit: usize,
    page: u32,
) -> Result<()> {
    if !all && item.is_none() {
        bail!("specify --item <counter> or --all");
    }
    let client = app.client()?;

    let mut opts = InstancesOptions {
        item_id: None,
        page,
    };
    if let Some(counter) = item {
        let found = client
            .get_item_by_counter(counter)
            .await
            .with_context(|| format!("getting item #{}", counter))?;
        opts.item_id = Some(found.id);
    }

    let mut instances = client.list_instances(&opts).await?;

    if let Some(since) = since {
        let cutoff = time::parse_since(&since, Utc::now()).context("invalid --since value")?;
        instances.retain(|inst| inst.time().is_some_and(|at| at > cutoff));
    }
    if limit > 0 {
        instances.truncate(limit);
    }

    let mut out = io::stdout().lock();
    app.formatter().format_instances(&mut out, &instances)?;
    Ok(())
}

pub async fn occurrence(app: &App, id: i64) -> Result<()> {
    let client = app.client()?;
    let instance = client.get_instance(id).await?;

    let mut out = io::stdout().lock();
    app.formatter().format_instance(&mut out, &instance)?;
    Ok(())
}

pub async fn context(
    app: &App,
    counter: i64,
    occurrences: usize,
    out_file: Option<PathBuf>,
) -> Result<()> {
    let client = app.client()?;
    let item = client.get_item_by_counter(counter).await?;

    let mut instances = item_instances(&client, &item).await?;
    let keep = if occurrences == 0 {
        DEFAULT_CONTEXT_OCCURRENCES
    } else {
        occurrences
    };
    instances.truncate(keep);

    let formatter = app.context_formatter();
    match out_file {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            app.notice(&format!("Writing context to {}", path.display()));

            let mut writer = BufWriter::new(file);
            formatter.format_context(&mut writer, &item, &instances)?;
            writer.flush()?;
        }
        None => {
            let mut out = io::stdout().lock();
            formatter.format_context(&mut out, &item, &instances)?;
        }
    }
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    let client = app.client()?;
    let info = client.get_project_info().await?;

    let mut out = io::stdout().lock();
    app.formatter().format_project_info(&mut out, &info)?;
    Ok(())
}

pub async fn resolve(app: &App, counters: Vec<String>, uuid: Option<i64>) -> Result<()> {
    let client = app.client()?;

    if let Some(id) = uuid {
        let item = client
            .update_item_status(id, &ItemStatus::Resolved)
            .await
            .context("failed to resolve item")?;
        app.notice(&resolved_line(&item));
        return Ok(());
    }

    let mut failures = Vec::new();
    let mut resolved = 0;

    for arg in &counters {
        match resolve_counter(&client, arg).await {
            Ok(item) => {
                resolved += 1;
                app.notice(&resolved_line(&item));
            }
            Err(e) => failures.push(e),
        }
    }

    if failures.is_empty() {
        return Ok(());
    }
    for e in &failures {
        eprintln!("{} {:#}", "Error:".red(), e);
    }
    if resolved == 0 {
        bail!("failed to resolve any items");
    }
    bail!(
        "resolved {} item(s), but {} failed",
        resolved,
        failures.len()
    )
}

async fn resolve_counter(client: &RollbarClient, arg: &str) -> Result<Item> {
    let counter: i64 = arg
        .trim()
        .trim_start_matches('#')
        .parse()
        .with_context(|| format!("invalid counter {:?}", arg))?;

    let item = client
        .get_item_by_counter(counter)
        .await
        .with_context(|| format!("failed to get item #{}", counter))?;
    client
        .update_item_status(item.id, &ItemStatus::Resolved)
        .await
        .with_context(|| format!("failed to resolve item #{}", counter))
}

fn resolved_line(item: &Item) -> String {
    format!("{} item #{}: {}", "Resolved".green(), item.counter, item.title)
}

pub fn config_show(app: &App) -> Result<()> {
    let mut out = io::stdout().lock();
    write_config(&mut out, &app.config, &config_source(app))?;
    Ok(())
}

/// Where the effective settings came from
fn config_source(app: &App) -> String {
    if let Some(path) = &app.config_path {
        return path.display().to_string();
    }
    if let Some(path) = Config::discover(&app.env.cwd) {
        return path.display().to_string();
    }
    if let Some(path) = app.env.global_config_path().filter(|p| p.exists()) {
        return path.display().to_string();
    }
    if app.env.access_token.is_some() {
        return "(environment variables)".to_string();
    }
    "(none)".to_string()
}

fn write_config(w: &mut dyn Write, config: &Config, source: &str) -> io::Result<()> {
    writeln!(w, "Config file: {}", source)?;
    writeln!(w)?;
    match config.masked_token() {
        Some(masked) => writeln!(w, "access_token: {}", masked)?,
        None => writeln!(w, "access_token: (not set)")?,
    }
    if let Some(project_id) = config.project_id {
        writeln!(w, "project_id: {}", project_id)?;
    }
    if !config.default_environment.is_empty() {
        writeln!(w, "default_environment: {}", config.default_environment)?;
    }
    writeln!(w, "output.format: {}", config.output.format)?;
    writeln!(w, "output.color: {}", config.output.color)
}

pub fn config_set(app: &App, key: &str, value: &str) -> Result<()> {
    let path = app.local_config_path();
    update_config_file(&path, key, value)?;
    info!("Updated {} in {}", key, path.display());

    if !app.quiet {
        println!("Set {} in {}", key, path.display());
    }
    Ok(())
}

/// Apply one setting to the file at `path`, creating it when missing
fn update_config_file(path: &Path, key: &str, value: &str) -> Result<Config> {
    let mut config = if path.exists() {
        Config::from_file(path)?
    } else {
        Config::default()
    };
    config.set(key, value)?;
    config
        .save(path)
        .with_context(|| format!("saving config to {}", path.display()))?;
    Ok(config)
}

pub fn init(app: &App) -> Result<()> {
    let path = app.local_config_path();
    let config = create_config_file(&path, app.env.access_token.clone())?;

    println!("Created {}", path.display());
    if config.access_token.is_empty() {
        println!();
        println!("Next steps:");
        println!("  1. Get a read token from Rollbar: Project Settings > Access Tokens");
        println!("  2. Run: rollbar config set access_token <your-token>");
        println!("  3. Test: rollbar whoami");
    }
    Ok(())
}

/// Write a fresh config; never overwrites an existing file
fn create_config_file(path: &Path, access_token: Option<String>) -> Result<Config> {
    if path.exists() {
        bail!("config file already exists: {}", path.display());
    }

    let mut config = Config::default();
    if let Some(token) = access_token {
        config.access_token = token;
    }
    config
        .save(path)
        .with_context(|| format!("creating config file {}", path.display()))?;
    Ok(config)
}
