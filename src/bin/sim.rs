use std::sync::Arc;

use anyhow::{anyhow, bail};
use battleship_sync::{
    init_logging, Cell, ClientConfig, InMemoryGateway, Lobby, Match, MatchClient, PlacementRules,
    PlayerId, SyncGateway, CELL_COUNT,
};
use clap::Parser;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::json;

/// Play one match between two random players over an in-memory store.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed for the challenger's placements and shots.
    seed1: u64,
    /// Seed for the invitee's placements and shots.
    seed2: u64,
    /// Allow ships to touch each other.
    #[arg(long)]
    lax_adjacency: bool,
}

async fn place_fleet(client: &mut MatchClient, rng: &mut SmallRng) -> anyhow::Result<()> {
    let me = client.me().clone();
    let rules = client.config().rules;
    loop {
        let m = client.refresh().await?;
        let Some(ship) = m.next_ship(&me)? else {
            return Ok(());
        };
        let run = m
            .board_of(&me)?
            .random_placement(rng, ship, rules)
            .ok_or_else(|| anyhow!("no room left for {}", ship.name()))?;
        client.place(run.origin(), run.end()).await?;
    }
}

fn random_target(m: &Match, me: &PlayerId, rng: &mut SmallRng) -> anyhow::Result<usize> {
    let board = m.board_of(m.opponent_of(me)?)?;
    let open: Vec<usize> = (0..CELL_COUNT)
        .filter(|&i| board.cell(i).is_some_and(|c| !Cell::is_resolved(c)))
        .collect();
    if open.is_empty() {
        bail!("no cells left to fire at");
    }
    Ok(open[rng.random_range(0..open.len())])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = ClientConfig {
        rules: if cli.lax_adjacency {
            PlacementRules::lax()
        } else {
            PlacementRules::default()
        },
        ..ClientConfig::default()
    };
    let gateway: Arc<dyn SyncGateway> = Arc::new(InMemoryGateway::new());
    let alice = Lobby::register(gateway.clone(), "alice", config).await?;
    let bob = Lobby::register(gateway.clone(), "bob", config).await?;

    let mut c1 = alice.challenge(bob.id()).await?;
    let mut invites = bob.subscribe_invites().await?;
    let snapshot = invites.next().await.unwrap_or_default();
    let invite = bob
        .pending_invites(&snapshot)
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("bob received no invite"))?;
    let mut c2 = bob.join(invite.match_id);
    c2.accept().await?;

    let mut rng1 = SmallRng::seed_from_u64(cli.seed1);
    let mut rng2 = SmallRng::seed_from_u64(cli.seed2);
    place_fleet(&mut c1, &mut rng1).await?;
    place_fleet(&mut c2, &mut rng2).await?;

    let mut shots = [0usize; 2];
    let winner = loop {
        let m = c1.refresh().await?.clone();
        if let Some(winner) = m.winner() {
            break winner.clone();
        }
        let turn = m
            .turn_owner()
            .ok_or_else(|| anyhow!("match left battle without a winner"))?
            .clone();
        let (client, rng, seat) = if turn == *c1.me() {
            (&mut c1, &mut rng1, 0)
        } else {
            (&mut c2, &mut rng2, 1)
        };
        let me = client.me().clone();
        let target = random_target(client.refresh().await?, &me, rng)?;
        client.fire(target).await?;
        shots[seat] += 1;
        if shots.iter().sum::<usize>() > 2 * CELL_COUNT {
            bail!("match did not finish");
        }
    };

    let name_of = |id: &PlayerId| {
        if id == alice.id() {
            "alice"
        } else {
            "bob"
        }
    };
    let result = json!({
        "match": c1.match_id().as_str(),
        "winner": name_of(&winner),
        "shots": { "alice": shots[0], "bob": shots[1] },
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
