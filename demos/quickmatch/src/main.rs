//! A scripted quick match: three players, one room, straight through a
//! full game. Run with `RUST_LOG=debug` to watch the engine's internals.
//!
//! The "transport" here is stdout; every notice batch is printed as the
//! JSON a real chat adapter would render into messages.

use molehunt_engine::{EngineConfig, GameEngine, Notices};
use molehunt_protocol::{Notice, PlayerId, Recipient, RoleCard, RoomId};
use tracing_subscriber::EnvFilter;

fn deliver(stage: &str, notices: &Notices) {
    println!("-- {stage}");
    for (recipient, notice) in notices {
        let to = match recipient {
            Recipient::All => "room".to_string(),
            Recipient::Player(p) => format!("{p}"),
            Recipient::AllExcept(p) => format!("all except {p}"),
        };
        println!("   [{to}] {}", serde_json::to_string(notice).expect("notices serialize"));
    }
}

fn impostor_in(notices: &Notices) -> (PlayerId, String) {
    let mut impostor = None;
    let mut secret = None;
    for (recipient, notice) in notices {
        if let (Recipient::Player(p), Notice::RoleCard { card }) = (recipient, notice) {
            match card {
                RoleCard::Impostor { .. } => impostor = Some(*p),
                RoleCard::Crew { secret: s } => secret = Some(s.clone()),
            }
        }
    }
    (impostor.expect("one impostor"), secret.expect("crew know the secret"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (engine, mut events) = GameEngine::new(EngineConfig::default());
    let room = RoomId(1);
    let (ada, ben, cleo) = (PlayerId(1), PlayerId(2), PlayerId(3));

    deliver("create", &engine.create_session(room, ada).await.unwrap());
    deliver("mode", &engine.select_mode(room, "speed").await.unwrap());
    for (player, name) in [(ada, "Ada"), (ben, "Ben"), (cleo, "Cleo")] {
        deliver("join", &engine.join(room, player, name.into()).await.unwrap());
    }

    let begin = engine.begin(room, ada).await.unwrap();
    deliver("begin", &begin);
    let (impostor, secret) = impostor_in(&begin);
    println!("   (the deal: {impostor} is the impostor, secret is {secret:?})");

    // Skip the discussion and vote out a crew member, so the impostor
    // survives into the guess window.
    deliver("start_voting", &engine.start_voting(room).await.unwrap());
    let scapegoat = [ada, ben, cleo].into_iter().find(|p| *p != impostor).unwrap();
    for voter in [ada, ben, cleo] {
        let receipt = engine.cast_vote(room, voter, scapegoat).await.unwrap();
        deliver("vote", &receipt.notices);
    }

    // The impostor blows the guess; crew win.
    let receipt = engine.submit_guess(room, impostor, "the moon?").await.unwrap();
    deliver("guess", &receipt.notices);

    // Any timer-driven batches (none in this script; every deadline was
    // beaten manually).
    while let Ok(event) = events.try_recv() {
        deliver("timer", &event.notices);
    }

    println!("-- final stats");
    for (player, stats) in engine.export_stats() {
        println!("   {player}: {}", serde_json::to_string(&stats).expect("stats serialize"));
    }
}
