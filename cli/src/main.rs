/*
    album-anniversaries | Rust CLI tool to surface album release anniversaries.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use anniversary_core::{
    get_access_token, Artist, CatalogSynchronizer, DateWindow, Section, SpotifyHttp, SyncConfig,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "album-anniversaries")]
#[command(about = "Albums from your favourite Spotify artists that just had a birthday", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ListArgs {
    /// Output the listed artists and albums to a JSON file (e.g., --json=week.json)
    #[arg(long)]
    json: Option<String>,

    /// Skip the response cache when fetching your artist list
    #[arg(long)]
    fresh: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Albums whose release anniversary was in the past 7 days
    Week(ListArgs),
    /// Albums whose release anniversary was in the past 30 days
    Month(ListArgs),
    /// Albums released in the past year
    Year(ListArgs),
    /// Adds every track of an album to your playback queue
    Queue {
        /// The Spotify ID of the album to queue
        #[arg(value_name = "ALBUM_ID")]
        album_id: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Week(args) => handle_section(Section::Week, args).await,
        Commands::Month(args) => handle_section(Section::Month, args).await,
        Commands::Year(args) => handle_section(Section::Year, args).await,
        Commands::Queue { album_id } => handle_queue(album_id).await,
    }
}

async fn get_synchronizer() -> CatalogSynchronizer {
    let config = match SyncConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };
    debug!("Using configuration {:?}", config);

    let token = match get_access_token().await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error initializing Spotify client: {}", e);
            process::exit(1);
        }
    };

    CatalogSynchronizer::new(Arc::new(SpotifyHttp::new(token)), config)
}

fn print_artist(artist: &Artist) {
    println!();
    println!("{}", artist);
    for album in &artist.albums {
        println!("   - {}", album);
    }
}

fn write_json_report(path: &str, artists: &[Artist]) -> anyhow::Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create file '{}'", path))?;
    let json_content = serde_json::to_string_pretty(artists)?;
    file.write_all(json_content.as_bytes())
        .context("Failed to write report to file")?;
    Ok(())
}

async fn handle_section(section: Section, args: &ListArgs) {
    let synchronizer = get_synchronizer().await;
    let window: DateWindow = synchronizer.window();
    println!("Looking for albums: {} ...", section.title());

    let mut updates = synchronizer.store().subscribe();
    let load = synchronizer.load_artists_with_albums(args.fresh);

    // Print artists as their batch lands instead of waiting for all of them.
    let progress = async {
        let mut printed = 0;
        let mut shown = 0;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let fresh = &snapshot.artists[printed.min(snapshot.artists.len())..];
            for artist in section.filter(fresh, &window) {
                print_artist(&artist);
                shown += 1;
            }
            printed = snapshot.artists.len();
            if snapshot.done {
                break;
            }
        }
        shown
    };

    let (result, shown) = tokio::join!(load, progress);

    match result {
        Ok(snapshot) => {
            let artists = section.filter(&snapshot.artists, &window);
            let albums: usize = artists.iter().map(|a| a.albums.len()).sum();

            println!();
            println!("---------------------------------------------------");
            println!("{}", section.title().to_uppercase());
            println!("---------------------------------------------------");
            println!("Artists: {}", artists.len());
            println!("Albums:  {}", albums);
            println!("---------------------------------------------------");

            if shown == 0 {
                println!();
                println!("Nothing to celebrate right now.");
            }

            if let Some(path) = args.json.as_deref() {
                match write_json_report(path, &artists) {
                    Ok(()) => {
                        println!();
                        println!("[SAVED] Report saved to: {}", path);
                    }
                    Err(e) => {
                        eprintln!();
                        eprintln!("[ERROR] {:#}", e);
                    }
                }
            }
        }
        Err(e) => {
            eprintln!();
            eprintln!("Loading albums failed: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_queue(album_id: &str) {
    let synchronizer = get_synchronizer().await;
    println!("Adding album {} to your queue...", album_id);

    match synchronizer.add_album_to_queue(album_id).await {
        Ok(report) => {
            println!();
            println!("[OK] Queued {} tracks.", report.tracks_queued);
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Failed to add album to queue: {}", e);
            process::exit(1);
        }
    }
}
