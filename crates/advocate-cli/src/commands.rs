use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, Utc};
use uuid::Uuid;

use advocate_core::models::event::filter_events;
use advocate_core::models::resource::filter_resources;
use advocate_core::models::{sample_templates, Collection, Event, EventDateFilter, Resource};
use advocate_core::offline::Fetched;
use advocate_core::repository::Repository;
use advocate_core::storage::{export_collection, import_collection};
use advocate_core::{Config, Services};

pub fn print_usage() {
    eprintln!(
        "Usage: advocate <command>

Commands:
  resources list [search]       List resources, optionally filtered by text
  resources reload              Re-read Resources.json from disk
  resources export <path>       Write resources to a JSON file
  resources import <path>       Replace resources with a JSON file
  events list [upcoming|past]   List events, soonest first
  events reload                 Re-read Events.json from disk
  events export <path>          Write events to a JSON file
  events import <path>          Replace events with a JSON file
  favorites list                List favorite resources
  favorites toggle <id>         Flip the favorite flag of a resource
  favorites migrate             Move legacy Favorites.json ids into the store
  letters list                  List the built-in letter templates
  letters generate <n> [k=v..]  Fill template <n> with key=value pairs
  user show                     Print the stored user profile
  user delete                   Remove the stored user profile
  cache clear                   Delete every cache entry
  cache clear-expired           Delete expired or unreadable cache entries
  sync                          Fetch resources and events (falls back to cache)
  config                        Print the effective configuration"
    );
}

pub async fn run(services: &Services, args: &[String]) -> Result<()> {
    let command = args[0].as_str();
    let sub = args.get(1).map(String::as_str);
    let arg = args.get(2).map(String::as_str);

    match (command, sub) {
        ("resources", Some("list")) => {
            let all = services.resources.get_all();
            let shown = filter_resources(&all, arg.unwrap_or(""), None);
            for r in &shown {
                println!("{}  [{}] {}", r.id, r.category, r.title);
            }
            eprintln!("{} of {} resources", shown.len(), all.len());
        }
        ("resources", Some("reload")) => reload(&services.resources),
        ("resources", Some("export")) => export(&services.resources, required_path(arg)?)?,
        ("resources", Some("import")) => import(&services.resources, required_path(arg)?)?,

        ("events", Some("list")) => {
            let filter = match arg {
                None | Some("all") => EventDateFilter::All,
                Some("upcoming") => EventDateFilter::Upcoming,
                Some("past") => EventDateFilter::Past,
                Some(other) => bail!("Unknown event filter: {}", other),
            };
            let shown = filter_events(&services.events.get_all(), None, filter, Utc::now());
            for e in &shown {
                let place = if e.is_virtual { "online" } else { e.location.as_str() };
                println!("{}  {}  {} ({})", e.id, e.date.format("%Y-%m-%d %H:%M"), e.title, place);
            }
            eprintln!("{} events", shown.len());
        }
        ("events", Some("reload")) => reload(&services.events),
        ("events", Some("export")) => export(&services.events, required_path(arg)?)?,
        ("events", Some("import")) => import(&services.events, required_path(arg)?)?,

        ("favorites", Some("list")) => {
            for r in services.favorite_resources() {
                println!("{}  {}", r.id, r.title);
            }
        }
        ("favorites", Some("toggle")) => {
            let raw = arg.ok_or_else(|| anyhow!("Missing resource id"))?;
            let id = Uuid::parse_str(raw).with_context(|| format!("Invalid id: {}", raw))?;
            match services.toggle_favorite(id) {
                Some(true) => println!("Added {} to favorites", id),
                Some(false) => println!("Removed {} from favorites", id),
                None => bail!("No resource with id {}", id),
            }
        }
        ("favorites", Some("migrate")) => {
            let migrated = services.migrate_legacy_favorites();
            println!("Migrated {} favorites", migrated);
        }

        ("letters", Some("list")) => {
            for (index, template) in sample_templates().iter().enumerate() {
                println!("{}  [{}] {}", index, template.category, template.title);
                for p in &template.placeholders {
                    let marker = if p.required { "*" } else { " " };
                    println!("     {}{}", marker, p.key);
                }
            }
        }
        ("letters", Some("generate")) => {
            let raw = arg.ok_or_else(|| anyhow!("Missing template number"))?;
            let index: usize = raw
                .parse()
                .with_context(|| format!("Invalid template number: {}", raw))?;
            let templates = sample_templates();
            let template = templates
                .get(index)
                .ok_or_else(|| anyhow!("No template {}", index))?;
            let values = placeholder_values(args.get(3..).unwrap_or_default())?;
            let missing = template.missing_required(&values);
            if !missing.is_empty() {
                bail!("Missing required fields: {}", missing.join(", "));
            }
            print!("{}", template.generate(&values, Local::now().date_naive()));
        }

        ("user", Some("show")) => match services.store.load_user() {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("No saved profile"),
        },
        ("user", Some("delete")) => {
            services.store.delete_user();
            println!("Profile deleted");
        }

        ("cache", Some("clear")) => {
            println!("Removed {} cache entries", services.cache.clear_all());
        }
        ("cache", Some("clear-expired")) => {
            println!("Removed {} expired cache entries", services.cache.clear_expired());
        }

        ("sync", _) => {
            let report = services.sync().await;
            print_fetched("resources", &report.resources);
            print_fetched("events", &report.events);
        }

        ("config", _) => {
            println!("config file:  {}", Config::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&services.config)?);
            println!("cache dir:    {}", services.cache.cache_dir().display());
            println!("data dir:     {}", services.collections.data_dir().display());
            for filename in [Resource::FILENAME, Event::FILENAME] {
                match services.collections.local_file_path(filename) {
                    Some(path) => println!("{:<13} {}", filename, path.display()),
                    None => println!("{:<13} (not created yet)", filename),
                }
            }
        }

        _ => {
            print_usage();
            bail!("Unknown command: {}", args.join(" "));
        }
    }

    Ok(())
}

fn required_path(arg: Option<&str>) -> Result<&Path> {
    arg.map(Path::new).ok_or_else(|| anyhow!("Missing file path"))
}

/// Parse `key=value` arguments. Keys may contain spaces when quoted.
fn placeholder_values(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("Expected key=value, got: {}", pair))
        })
        .collect()
}

fn reload<T: Collection>(repo: &Repository<T>) {
    let items = repo.reload();
    println!("Reloaded {} {}", items.len(), T::LABEL);
}

fn export<T: Collection>(repo: &Repository<T>, path: &Path) -> Result<()> {
    let items = repo.get_all();
    export_collection(&items, path)
        .with_context(|| format!("Failed to export {}", T::LABEL))?;
    println!("Exported {} {} to {}", items.len(), T::LABEL, path.display());
    Ok(())
}

fn import<T: Collection>(repo: &Repository<T>, path: &Path) -> Result<()> {
    let items: Vec<T> = import_collection(path)
        .ok_or_else(|| anyhow!("Could not read {} from {}", T::LABEL, path.display()))?;
    repo.save_all(items);
    let count = repo.reload().len();
    println!("Imported {} {}", count, T::LABEL);
    Ok(())
}

fn print_fetched<T>(label: &str, fetched: &Fetched<T>) {
    println!("{}: {} items from {}", label, fetched.items.len(), fetched.source);
    if let Some(message) = fetched.error {
        eprintln!("  {}", message);
    }
}
