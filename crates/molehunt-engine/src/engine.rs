//! The public engine API: session lifecycle, phase transitions, and the
//! expiry dispatch loop.
//!
//! Every operation follows the same shape: validate and mutate inside a
//! single [`SessionStore::mutate`] call, collect `(Recipient, Notice)`
//! pairs, and hand them back to the caller *after* the room lock is
//! released. The engine performs no I/O; delivering notices and
//! persisting stats are the transport's and storage collaborator's jobs.
//!
//! Timer-driven transitions (discussion over, voting over, guess window
//! closed) go through the same validation but emit their notices on the
//! engine's outbound event channel, since there is no caller to return
//! them to.

use std::sync::Arc;

use molehunt_protocol::{Notice, PlayerId, Recipient, RoleCard, RoomId, Side};
use molehunt_stats::{Ballot, GameOutcome, Leaderboard, PlayerOutcome, PlayerStats, StatsBook};
use molehunt_timer::{Expiry, TimerPurpose, TimerScheduler};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::deck::{matches_guess, SecretDeck};
use crate::error::EngineError;
use crate::mode::{ModeConfig, ModeName};
use crate::phase::Phase;
use crate::roles;
use crate::session::{BallotRecord, PlayerEntry, Session};
use crate::store::SessionStore;
use crate::vote::{self, RoundOutcome};

/// Addressed notices produced by one operation, in emission order.
pub type Notices = Vec<(Recipient, Notice)>;

/// A timer-driven batch of notices, delivered on the engine's event
/// channel.
#[derive(Debug)]
pub struct EngineEvent {
    pub room_id: RoomId,
    pub notices: Notices,
}

/// Engine construction options.
pub struct EngineConfig {
    /// The secret pool games draw from.
    pub deck: SecretDeck,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { deck: SecretDeck::standard() }
    }
}

/// A snapshot of one room's session metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub mode: Option<ModeName>,
    pub host: PlayerId,
    pub player_count: usize,
}

/// Result of an accepted vote.
#[derive(Debug)]
pub struct VoteReceipt {
    /// True when this ballot was the last one and closed the round.
    pub voting_complete: bool,
    pub notices: Notices,
}

/// Result of a submitted guess.
#[derive(Debug)]
pub struct GuessReceipt {
    pub correct: bool,
    pub notices: Notices,
}

/// Everything needed to settle a finished game once the room lock is
/// released.
struct Conclusion {
    winner: Side,
    outcome: GameOutcome,
}

struct EngineInner {
    store: SessionStore,
    scheduler: TimerScheduler,
    stats: StatsBook,
    deck: SecretDeck,
    events: mpsc::UnboundedSender<EngineEvent>,
}

/// The game session engine. Cheap to clone; all clones share state.
///
/// Construct with [`GameEngine::new`] inside a tokio runtime; the
/// engine spawns its expiry dispatch task at construction.
#[derive(Clone)]
pub struct GameEngine {
    inner: Arc<EngineInner>,
}

impl GameEngine {
    /// Creates the engine and the channel timer-driven notices arrive on.
    pub fn new(config: EngineConfig) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (scheduler, expiry_rx) = TimerScheduler::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(EngineInner {
            store: SessionStore::new(),
            scheduler,
            stats: StatsBook::new(),
            deck: config.deck,
            events: events_tx,
        });
        tokio::spawn(dispatch_expiries(inner.clone(), expiry_rx));
        (Self { inner }, events_rx)
    }

    /// Registers a session for `room` in `ModeSelect`, hosted by `host`.
    pub async fn create_session(
        &self,
        room: RoomId,
        host: PlayerId,
    ) -> Result<Notices, EngineError> {
        self.inner.store.create(room, host)?;
        let modes = ModeName::ALL.iter().map(|m| m.to_string()).collect();
        Ok(vec![(Recipient::All, Notice::SessionCreated { host, modes })])
    }

    /// Picks the game mode and opens the lobby.
    pub async fn select_mode(&self, room: RoomId, mode: &str) -> Result<Notices, EngineError> {
        let mode: ModeName = mode
            .parse()
            .map_err(|()| EngineError::UnknownMode(mode.to_string()))?;
        self.inner
            .store
            .mutate(room, |s| {
                if s.phase != Phase::ModeSelect {
                    return Err(invalid_phase(s));
                }
                s.mode = Some(mode);
                s.phase = Phase::Waiting;
                info!(room_id = %room, %mode, "mode chosen, lobby open");
                Ok(vec![(
                    Recipient::All,
                    Notice::ModeChosen {
                        mode: mode.to_string(),
                        min_players: mode.config().min_players,
                    },
                )])
            })
            .await
    }

    /// Adds a player to the lobby.
    pub async fn join(
        &self,
        room: RoomId,
        player: PlayerId,
        display_name: String,
    ) -> Result<Notices, EngineError> {
        self.inner
            .store
            .mutate(room, move |s| {
                if !s.phase.is_lobby() {
                    return Err(EngineError::GameStarted(room));
                }
                if s.is_member(player) {
                    return Err(EngineError::AlreadyJoined(player, room));
                }
                let cfg = mode_config(s);
                if s.roster.len() >= cfg.max_players {
                    return Err(EngineError::RoomFull(room));
                }

                s.roster.push(PlayerEntry {
                    id: player,
                    display_name: display_name.clone(),
                });
                let player_count = s.roster.len();
                let ready = player_count >= cfg.min_players;
                info!(room_id = %room, %player, player_count, "player joined");
                Ok(vec![(
                    Recipient::All,
                    Notice::PlayerJoined { player, display_name, player_count, ready },
                )])
            })
            .await
    }

    /// Removes a player from the lobby. The host role passes to the
    /// earliest remaining joiner; an emptied lobby is destroyed.
    pub async fn leave(&self, room: RoomId, player: PlayerId) -> Result<Notices, EngineError> {
        let (notices, emptied) = self
            .inner
            .store
            .mutate(room, |s| {
                if !s.phase.is_lobby() {
                    return Err(EngineError::GameStarted(room));
                }
                s.remove_player(player)
                    .ok_or(EngineError::NotJoined(player, room))?;

                let mut new_host = None;
                if s.host == player {
                    if let Some(next) = s.roster.first() {
                        s.host = next.id;
                        new_host = Some(next.id);
                        info!(room_id = %room, host = %next.id, "host handed over");
                    }
                }

                let emptied = s.roster.is_empty();
                let mut notices = vec![(Recipient::All, Notice::PlayerLeft { player, new_host })];
                if emptied {
                    notices.push((Recipient::All, Notice::SessionClosed));
                }
                info!(room_id = %room, %player, "player left");
                Ok((notices, emptied))
            })
            .await?;

        if emptied {
            self.inner.scheduler.forget(room);
            self.inner.store.remove(room);
            info!(room_id = %room, "lobby emptied, session closed");
        }
        Ok(notices)
    }

    /// Starts the game: deals roles and the secret, opens discussion.
    /// Host-only.
    pub async fn begin(&self, room: RoomId, requester: PlayerId) -> Result<Notices, EngineError> {
        let inner = &self.inner;
        inner
            .store
            .mutate(room, |s| {
                if s.phase != Phase::Waiting {
                    return Err(invalid_phase(s));
                }
                if requester != s.host {
                    return Err(EngineError::NotAuthorized(requester));
                }
                let cfg = mode_config(s);
                if s.roster.len() < cfg.min_players {
                    return Err(EngineError::InsufficientPlayers {
                        mode: cfg.name.to_string(),
                        required: cfg.min_players,
                        actual: s.roster.len(),
                    });
                }

                let mut rng = rand::rng();
                let assignment =
                    roles::assign(&s.player_ids(), cfg.variant, &inner.deck, &mut rng);
                s.secret = Some(assignment.secret.clone());
                s.impostors = assignment.impostors;
                s.decoys = assignment.decoys;
                s.phase = Phase::Discussion;
                inner
                    .scheduler
                    .arm(room, TimerPurpose::Discussion, cfg.discussion);

                let mut notices = Notices::new();
                for entry in &s.roster {
                    let card = if s.impostors.contains(&entry.id) {
                        let mut partners: Vec<PlayerId> = s
                            .impostors
                            .iter()
                            .copied()
                            .filter(|p| *p != entry.id)
                            .collect();
                        partners.sort();
                        RoleCard::Impostor { partners }
                    } else if let Some(wrong) = s.decoys.get(&entry.id) {
                        RoleCard::Crew { secret: wrong.clone() }
                    } else {
                        RoleCard::Crew { secret: assignment.secret.clone() }
                    };
                    notices.push((Recipient::Player(entry.id), Notice::RoleCard { card }));
                }
                notices.push((
                    Recipient::All,
                    Notice::DiscussionStarted {
                        mode: cfg.name.to_string(),
                        seconds: cfg.discussion.as_secs(),
                    },
                ));
                info!(
                    room_id = %room,
                    mode = %cfg.name,
                    players = s.roster.len(),
                    impostors = s.impostors.len(),
                    "game started"
                );
                Ok(notices)
            })
            .await
    }

    /// Cuts discussion short and opens the ballot.
    pub async fn start_voting(&self, room: RoomId) -> Result<Notices, EngineError> {
        let inner = &self.inner;
        inner
            .store
            .mutate(room, |s| {
                if s.phase != Phase::Discussion {
                    return Err(invalid_phase(s));
                }
                inner.scheduler.cancel(room, TimerPurpose::Discussion);
                let mut notices = Notices::new();
                inner.open_ballot(s, &mut notices);
                Ok(notices)
            })
            .await
    }

    /// Records one vote. When the last roster member votes, the same
    /// call closes the round, and that caller alone triggers the tally.
    pub async fn cast_vote(
        &self,
        room: RoomId,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<VoteReceipt, EngineError> {
        let inner = &self.inner;
        let (voting_complete, mut notices, conclusion) = inner
            .store
            .mutate(room, |s| {
                let complete = vote::record_vote(s, voter, target)?;
                debug!(room_id = %room, %voter, %target, complete, "vote recorded");
                let mut notices = vec![(
                    Recipient::All,
                    Notice::VoteProgress { cast: s.votes.len(), needed: s.roster.len() },
                )];
                let mut conclusion = None;
                if complete {
                    conclusion = inner.close_round(s, &mut notices);
                }
                Ok((complete, notices, conclusion))
            })
            .await?;

        if let Some(conclusion) = conclusion {
            inner.settle(room, conclusion, &mut notices);
        }
        Ok(VoteReceipt { voting_complete, notices })
    }

    /// The surviving impostor's guess at the secret. Ends the game
    /// either way.
    pub async fn submit_guess(
        &self,
        room: RoomId,
        player: PlayerId,
        guess: &str,
    ) -> Result<GuessReceipt, EngineError> {
        let inner = &self.inner;
        let (correct, mut notices, conclusion) = inner
            .store
            .mutate(room, |s| {
                if s.phase != Phase::AwaitingGuess || !s.impostors.contains(&player) {
                    return Err(EngineError::NotAwaitingGuess(room));
                }
                inner.scheduler.cancel(room, TimerPurpose::Guess);

                let canonical = s.secret.clone().expect("secret dealt before play");
                let correct = matches_guess(&canonical, guess);
                let winner = if correct { Side::Impostors } else { Side::Crew };
                info!(room_id = %room, %player, correct, "guess submitted");

                let mut notices = Notices::new();
                let conclusion = inner.conclude(s, winner, &mut notices);
                Ok((correct, notices, conclusion))
            })
            .await?;

        inner.settle(room, conclusion, &mut notices);
        Ok(GuessReceipt { correct, notices })
    }

    /// Aborts the session without recording stats. Host-only.
    pub async fn end_session(
        &self,
        room: RoomId,
        requester: PlayerId,
    ) -> Result<Notices, EngineError> {
        self.inner
            .store
            .mutate(room, |s| {
                if requester != s.host {
                    return Err(EngineError::NotAuthorized(requester));
                }
                Ok(())
            })
            .await?;

        self.inner.scheduler.forget(room);
        self.inner.store.remove(room);
        info!(room_id = %room, %requester, "session ended by host");
        Ok(vec![(Recipient::All, Notice::SessionClosed)])
    }

    /// Metadata snapshot for one room.
    pub async fn room_info(&self, room: RoomId) -> Result<RoomInfo, EngineError> {
        self.inner
            .store
            .mutate(room, |s| {
                Ok(RoomInfo {
                    room_id: s.room_id,
                    phase: s.phase,
                    mode: s.mode,
                    host: s.host,
                    player_count: s.roster.len(),
                })
            })
            .await
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        self.inner.store.len()
    }

    /// A player's cumulative stats, if they have finished a game.
    pub fn player_stats(&self, player: PlayerId) -> Option<PlayerStats> {
        self.inner.stats.snapshot(player)
    }

    /// The current leaderboard.
    pub fn leaderboard(&self) -> Leaderboard {
        self.inner.stats.leaderboard()
    }

    /// Full stats table for the storage collaborator.
    pub fn export_stats(&self) -> Vec<(PlayerId, PlayerStats)> {
        self.inner.stats.export()
    }
}

impl EngineInner {
    /// Opens a fresh voting round. Callers have already validated the
    /// transition (`Discussion → Voting` or the `Voting → Voting` loop).
    fn open_ballot(&self, s: &mut Session, notices: &mut Notices) {
        debug_assert!(s.phase.can_transition_to(Phase::Voting));
        s.phase = Phase::Voting;
        s.votes.clear();
        let cfg = mode_config(s);
        self.scheduler
            .arm(s.room_id, TimerPurpose::Voting, cfg.voting);
        notices.push((
            Recipient::All,
            Notice::BallotOpened {
                candidates: s.candidates(),
                seconds: cfg.voting.as_secs(),
            },
        ));
        info!(room_id = %s.room_id, candidates = s.roster.len(), "ballot opened");
    }

    /// Closes the open voting round: tallies, eliminates, and either
    /// re-opens voting, opens the guess window, or concludes the game.
    /// Runs under the room lock; phase is `Voting` on entry.
    fn close_round(&self, s: &mut Session, notices: &mut Notices) -> Option<Conclusion> {
        self.scheduler.cancel(s.room_id, TimerPurpose::Voting);

        let counts = vote::tally(&s.votes);
        let mut rng = rand::rng();
        let pick = vote::pick_eliminated(&counts, &mut rng);

        // Archive the round's ballots before the roster can shrink;
        // accuracy is judged against the impostor set as of right now.
        let records: Vec<BallotRecord> = s
            .votes
            .iter()
            .map(|(voter, target)| BallotRecord {
                voter: *voter,
                voter_name: s
                    .display_name(*voter)
                    .expect("voter was in roster when the vote was recorded")
                    .to_string(),
                caught: s.impostors.contains(target),
            })
            .collect();
        s.ballot_history.extend(records);
        s.votes.clear();

        match &pick {
            Some(pick) => {
                let was_impostor = s.impostors.contains(&pick.player);
                notices.push((
                    Recipient::All,
                    Notice::Eliminated {
                        player: pick.player,
                        votes: pick.votes,
                        tie_break: pick.tie_break,
                        was_impostor,
                    },
                ));
                info!(
                    room_id = %s.room_id,
                    eliminated = %pick.player,
                    votes = pick.votes,
                    tie_break = pick.tie_break,
                    was_impostor,
                    "round closed"
                );
            }
            None => {
                info!(room_id = %s.room_id, "round closed with zero votes, impostors win by default");
            }
        }

        let cfg = mode_config(s);
        let outcome =
            vote::policy_for(cfg.variant).resolve(s, pick.map(|p| p.player));
        match outcome {
            RoundOutcome::Ended { winner } => Some(self.conclude(s, winner, notices)),
            RoundOutcome::Revote { impostors_remaining } => {
                notices.push((
                    Recipient::All,
                    Notice::RevoteStarted { impostors_remaining },
                ));
                self.open_ballot(s, notices);
                None
            }
            RoundOutcome::AwaitGuess { impostor } => {
                s.phase = Phase::AwaitingGuess;
                self.scheduler.arm(s.room_id, TimerPurpose::Guess, cfg.guess);
                notices.push((
                    Recipient::Player(impostor),
                    Notice::GuessWindowOpened { seconds: cfg.guess.as_secs() },
                ));
                info!(room_id = %s.room_id, %impostor, "guess window opened");
                None
            }
        }
    }

    /// The single terminal transition. Marks the session `Ended`, emits
    /// the game-over notice, and captures everything stats settlement
    /// needs. Every path that finishes a game funnels through here, and
    /// each checks the phase first under the lock, which is what makes
    /// finalization once-only.
    fn conclude(&self, s: &mut Session, winner: Side, notices: &mut Notices) -> Conclusion {
        debug_assert!(s.phase.can_transition_to(Phase::Ended));
        s.phase = Phase::Ended;

        let mut impostors: Vec<PlayerId> = s.impostors.iter().copied().collect();
        impostors.sort();
        let secret = s.secret.clone().expect("secret dealt before play");
        notices.push((
            Recipient::All,
            Notice::GameOver { winner, impostors: impostors.clone(), secret },
        ));

        let outcome = GameOutcome {
            winner,
            players: s
                .roster
                .iter()
                .map(|p| PlayerOutcome {
                    player: p.id,
                    display_name: p.display_name.clone(),
                    impostor: s.impostors.contains(&p.id),
                })
                .collect(),
            ballots: s
                .ballot_history
                .iter()
                .map(|b| Ballot {
                    voter: b.voter,
                    voter_name: b.voter_name.clone(),
                    caught: b.caught,
                })
                .collect(),
        };
        Conclusion { winner, outcome }
    }

    /// Settles a concluded game outside the room lock: tears the room
    /// down, updates the stats book, and appends achievement notices.
    fn settle(&self, room: RoomId, conclusion: Conclusion, notices: &mut Notices) {
        self.scheduler.forget(room);
        self.store.remove(room);
        for (player, ids) in self.stats.finalize(&conclusion.outcome) {
            notices.push((
                Recipient::Player(player),
                Notice::AchievementsUnlocked { ids },
            ));
        }
        info!(room_id = %room, winner = %conclusion.winner, "game settled");
    }

    /// Reacts to a fired timer. Generation and phase are both
    /// re-validated under the room lock; any mismatch means the session
    /// advanced through another path and the expiry is dropped silently.
    async fn handle_expiry(&self, expiry: Expiry) -> Notices {
        let room = expiry.room_id;
        let result = self
            .store
            .mutate(room, |s| {
                if !self.scheduler.is_current(room, expiry.generation) {
                    trace!(room_id = %room, purpose = %expiry.purpose, "stale timer ignored");
                    return Ok((Notices::new(), None));
                }
                let mut notices = Notices::new();
                let mut conclusion = None;
                match expiry.purpose {
                    TimerPurpose::Discussion => {
                        if s.phase == Phase::Discussion {
                            info!(room_id = %room, "discussion time over");
                            self.open_ballot(s, &mut notices);
                        }
                    }
                    TimerPurpose::Voting => {
                        if s.phase == Phase::Voting {
                            info!(room_id = %room, "voting time over");
                            conclusion = self.close_round(s, &mut notices);
                        }
                    }
                    TimerPurpose::Guess => {
                        if s.phase == Phase::AwaitingGuess {
                            info!(room_id = %room, "guess window expired");
                            conclusion = Some(self.conclude(s, Side::Crew, &mut notices));
                        }
                    }
                }
                Ok((notices, conclusion))
            })
            .await;

        match result {
            Ok((mut notices, conclusion)) => {
                if let Some(conclusion) = conclusion {
                    self.settle(room, conclusion, &mut notices);
                }
                notices
            }
            Err(_) => {
                // Room already destroyed; nothing to do.
                trace!(room_id = %room, "timer fired for a removed session");
                Notices::new()
            }
        }
    }
}

/// The engine's "scheduler thread": drains fired timers and forwards
/// their notices to the event channel.
async fn dispatch_expiries(
    inner: Arc<EngineInner>,
    mut expiries: mpsc::UnboundedReceiver<Expiry>,
) {
    while let Some(expiry) = expiries.recv().await {
        let room_id = expiry.room_id;
        let notices = inner.handle_expiry(expiry).await;
        if !notices.is_empty() {
            // Receiver dropped means the embedding process is shutting
            // down; nothing useful to do with the notices then.
            let _ = inner.events.send(EngineEvent { room_id, notices });
        }
    }
}

/// The session's mode config. Legal only after `ModeSelect`; every
/// caller is past the phase check that guarantees it.
fn mode_config(s: &Session) -> &'static ModeConfig {
    s.mode.expect("mode is chosen before leaving ModeSelect").config()
}

fn invalid_phase(s: &Session) -> EngineError {
    EngineError::InvalidPhase { room_id: s.room_id, phase: s.phase }
}
