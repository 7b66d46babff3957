// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line sender for Beacon analytics events.

use anyhow::{bail, Context, Result};
use beacon::{BeaconClient, ClientConfig, Event, Properties, EU_RESIDENCY_ENDPOINT};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "beacon", about = "Send analytics events to an ingestion endpoint", version)]
struct Cli {
	/// Emit logs as JSON lines
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Submit one or more events and wait for delivery
	Send(SendArgs),
	/// Print the effective client configuration
	Config(ConnectionArgs),
}

#[derive(Args, Debug)]
struct ConnectionArgs {
	/// Project API key
	#[arg(long, env = "BEACON_API_KEY", hide_env_values = true)]
	api_key: Option<String>,

	/// Ingestion URL, overriding BEACON_ENDPOINT and BEACON_REGION
	#[arg(long)]
	endpoint: Option<String>,

	/// Use the EU residency endpoint
	#[arg(long, conflicts_with = "endpoint")]
	eu: bool,
}

impl ConnectionArgs {
	fn config(&self) -> Result<ClientConfig> {
		let mut config = ClientConfig::from_env().context("invalid BEACON_* environment")?;
		if let Some(endpoint) = &self.endpoint {
			config.endpoint = endpoint.clone();
		} else if self.eu {
			config.endpoint = EU_RESIDENCY_ENDPOINT.to_string();
		}
		config.validate()?;
		Ok(config)
	}
}

#[derive(Args, Debug)]
struct SendArgs {
	#[command(flatten)]
	connection: ConnectionArgs,

	/// Event type, e.g. `app.started`
	event_type: String,

	#[arg(long)]
	user_id: Option<String>,

	#[arg(long)]
	device_id: Option<String>,

	/// Event property as key=value; values that parse as JSON keep their type
	#[arg(long = "property", short = 'p', value_parser = parse_property)]
	properties: Vec<(String, Value)>,

	/// Number of copies to submit
	#[arg(long, default_value_t = 1)]
	count: usize,
}

fn parse_property(raw: &str) -> Result<(String, Value)> {
	let Some((key, value)) = raw.split_once('=') else {
		bail!("expected key=value, got '{raw}'");
	};
	if key.is_empty() {
		bail!("property key must not be empty");
	}
	let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
	Ok((key.to_string(), value))
}

fn build_event(args: &SendArgs) -> Result<Event> {
	if args.user_id.is_none() && args.device_id.is_none() {
		bail!("either --user-id or --device-id is required");
	}

	let mut event = Event::new(&args.event_type);
	if let Some(user_id) = &args.user_id {
		event = event.with_user_id(user_id);
	}
	if let Some(device_id) = &args.device_id {
		event = event.with_device_id(device_id);
	}
	if !args.properties.is_empty() {
		let properties: Properties = args.properties.iter().cloned().collect();
		event = event.with_event_properties(properties);
	}
	Ok(event)
}

async fn send(args: SendArgs) -> Result<()> {
	let api_key = args
		.connection
		.api_key
		.clone()
		.context("an API key is required (--api-key or BEACON_API_KEY)")?;
	let event = build_event(&args)?;

	let client = BeaconClient::builder(api_key)
		.config(args.connection.config()?)
		.build()?;

	for _ in 0..args.count {
		client.submit(event.clone()).await?;
	}
	client.close().await?;

	let stats = client.stats();
	println!(
		"submitted {} event(s): {} delivered, {} dropped after {} attempt(s)",
		stats.submitted_events, stats.delivered_events, stats.dropped_events, stats.attempts
	);
	if stats.dropped_events > 0 {
		bail!("{} event(s) could not be delivered", stats.dropped_events);
	}
	Ok(())
}

fn init_tracing(json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	let registry = tracing_subscriber::registry().with(filter);
	if json {
		registry.with(tracing_subscriber::fmt::layer().json()).init();
	} else {
		registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init();
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.json_logs);

	match cli.command {
		Command::Send(args) => send(args).await,
		Command::Config(args) => {
			println!("{:#?}", args.config()?);
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn property_values_keep_json_types() {
		assert_eq!(
			parse_property("count=3").unwrap(),
			("count".to_string(), Value::from(3))
		);
		assert_eq!(
			parse_property("paid=true").unwrap(),
			("paid".to_string(), Value::Bool(true))
		);
		assert_eq!(
			parse_property("plan=pro").unwrap(),
			("plan".to_string(), Value::String("pro".to_string()))
		);
		assert_eq!(
			parse_property("query=a=b").unwrap(),
			("query".to_string(), Value::String("a=b".to_string()))
		);
	}

	#[test]
	fn property_without_separator_is_rejected() {
		assert!(parse_property("plan").is_err());
		assert!(parse_property("=pro").is_err());
	}

	#[test]
	fn send_parses_repeated_properties() {
		let cli = Cli::parse_from([
			"beacon",
			"send",
			"checkout.completed",
			"--api-key",
			"foo",
			"--user-id",
			"u-1",
			"-p",
			"plan=pro",
			"-p",
			"seats=4",
		]);
		let Command::Send(args) = cli.command else {
			panic!("expected send");
		};

		let event = build_event(&args).unwrap();
		let properties = event.event_properties.unwrap();
		assert_eq!(properties["plan"], "pro");
		assert_eq!(properties["seats"], 4);
		assert_eq!(event.user_id.as_deref(), Some("u-1"));
	}

	#[test]
	fn send_requires_an_identity() {
		let cli = Cli::parse_from(["beacon", "send", "e", "--api-key", "foo"]);
		let Command::Send(args) = cli.command else {
			panic!("expected send");
		};
		assert!(build_event(&args).is_err());
	}

	#[test]
	fn eu_flag_conflicts_with_endpoint() {
		let result = Cli::try_parse_from([
			"beacon",
			"config",
			"--eu",
			"--endpoint",
			"http://localhost",
		]);
		assert!(result.is_err());
	}
}
