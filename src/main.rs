mod display;

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use display::{MenuView, Overlay, Viewport};
use space_escape::assets::{music_for_phase, AssetRegistry};
use space_escape::compute::{
    add_player_two, move_player, player_shoot, point_player, start_run, tick, toggle_mouse_control,
    toggle_pause, RunOptions,
};
use space_escape::constants::{MAX_NAME_LEN, TICK_MS};
use space_escape::controls::{
    confirms_quit, hotkey, menu_action, player_keys, HeldKeys, Hotkey, MenuAction,
};
use space_escape::entities::{GameEvent, RunState, RunStatus};
use space_escape::highscores::HighScores;
use space_escape::persistence::{load_run, save_run};

const FRAME: Duration = Duration::from_millis(TICK_MS as u64);

/// Min frames between volleys while a fire key is held.
/// 6 frames @ 60 FPS = 10 volleys/sec.
const FIRE_COOLDOWN: u32 = 6;

/// How long a status line ("Game saved") stays on screen, in frames.
const NOTICE_FRAMES: u64 = 120;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal meteor shooter with a three-part boss", long_about = None)]
struct Args {
    /// Save-game file (F1 / F2). Defaults to ~/.space_escape_save.json
    #[arg(long)]
    save_file: Option<PathBuf>,
    /// High-score table. Defaults to ~/.space_escape_scores.json
    #[arg(long)]
    highscore_file: Option<PathBuf>,
    /// Directory holding text sprites and sound cues.
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,
    /// Log file; the terminal itself is busy drawing the game.
    #[arg(long, default_value = "space_escape.log")]
    log_file: PathBuf,
    /// Seed the RNG for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Credits available when the menu opens.
    #[arg(long, default_value_t = 0)]
    credits: u32,
    /// Start with player two enabled.
    #[arg(long)]
    player2: bool,
    /// Start with pointer control for player one.
    #[arg(long)]
    mouse: bool,
}

fn home_file(name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(name)
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Shared, read-only context for one program session.
struct Session<'a> {
    assets: &'a AssetRegistry,
    save_path: PathBuf,
    score_path: PathBuf,
}

/// Blocks for the next key press, skipping repeats, releases and mouse noise.
fn next_key(rx: &mpsc::Receiver<Event>) -> Result<KeyEvent> {
    loop {
        match rx.recv().context("input thread stopped")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(key),
            _ => {}
        }
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

/// Returns the run to play, or `None` when the player quits.
fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    menu: &mut MenuView,
    scores: &HighScores,
    session: &Session<'_>,
    rng: &mut StdRng,
) -> Result<Option<RunState>> {
    loop {
        display::render_menu(out, menu, scores)?;
        let key = next_key(rx)?;

        if menu.confirm_quit {
            if confirms_quit(key.code) {
                return Ok(None);
            }
            menu.confirm_quit = false;
            continue;
        }

        menu.notice = None;
        match menu_action(key.code) {
            Some(MenuAction::InsertCoin) => menu.credits += 1,
            Some(MenuAction::ToggleHighScores) => menu.show_scores = !menu.show_scores,
            Some(MenuAction::TogglePlayerTwo) => menu.player2 = !menu.player2,
            Some(MenuAction::ToggleMouse) => menu.mouse_control = !menu.mouse_control,
            Some(MenuAction::Quit) => menu.confirm_quit = true,
            Some(MenuAction::Start) => {
                let options = RunOptions {
                    player2: menu.player2,
                    mouse_control: menu.mouse_control,
                    credits: menu.credits,
                };
                match start_run(menu.credits, &options, rng) {
                    Some(state) => return Ok(Some(state)),
                    None => {
                        session.assets.sound("hit").play(out)?;
                        menu.notice = Some("Insert a coin first (C)".to_string());
                    }
                }
            }
            Some(MenuAction::LoadSave) => match load_run(&session.save_path, menu.credits) {
                Ok(Some(state)) => {
                    info!(path = %session.save_path.display(), "run loaded from menu");
                    return Ok(Some(state));
                }
                Ok(None) => menu.notice = Some("No saved game".to_string()),
                Err(err) => {
                    warn!("save unreadable: {err:#}");
                    menu.notice = Some("Saved game is unreadable".to_string());
                }
            },
            None => {}
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum LoopExit {
    Quit,
    Finished { won: bool, score: u32 },
}

/// Plays sound cues and switches music for the events queued on `state`,
/// then clears them so a frozen frame doesn't replay them.
fn play_events<W: Write>(
    out: &mut W,
    state: &mut RunState,
    assets: &AssetRegistry,
    track: &mut Option<&'static str>,
) -> Result<()> {
    for event in state.events.drain(..) {
        match event {
            GameEvent::PhaseStarted(phase) => {
                let next = music_for_phase(phase);
                if *track != Some(next) {
                    info!(track = next, silent = assets.sound(next).is_silent(), "music");
                    *track = Some(next);
                }
            }
            other => {
                if let Some(sound) = assets.sound_for(other) {
                    sound.play(out)?;
                }
            }
        }
    }
    Ok(())
}

/// Input model: instead of acting on each key event individually, we keep a
/// `HeldKeys` map of the frame each key was last seen. Each frame the fresh
/// keys are applied together, so both players can move and fire at once.
/// One-shot keys (pause, save, load, quit, ...) act on the press itself.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut RunState,
    rx: &mpsc::Receiver<Event>,
    session: &Session<'_>,
    rng: &mut StdRng,
) -> Result<LoopExit> {
    let mut held = HeldKeys::default();
    let mut fire_cooldown = [0u32; 2];
    let mut frame: u64 = 0;
    let mut confirm_quit = false;
    let mut notice: Option<(String, u64)> = None;
    let mut track: Option<&'static str> = None;

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let (width, height) = terminal::size()?;
        let viewport = Viewport { width, height };

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    KeyEventKind::Press => {
                        if confirm_quit {
                            if confirms_quit(code) {
                                info!("quit confirmed in game");
                                return Ok(LoopExit::Quit);
                            }
                            confirm_quit = false;
                            continue;
                        }
                        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                            confirm_quit = true;
                            held.clear();
                            continue;
                        }

                        held.press(code, frame);
                        match hotkey(code) {
                            Some(Hotkey::Quit) => {
                                confirm_quit = true;
                                held.clear();
                            }
                            Some(Hotkey::Pause) => *state = toggle_pause(state),
                            Some(Hotkey::AddPlayerTwo) => *state = add_player_two(state),
                            Some(Hotkey::ToggleMouse) => *state = toggle_mouse_control(state),
                            Some(Hotkey::Save) => {
                                let msg = match save_run(&session.save_path, state) {
                                    Ok(()) => {
                                        info!(path = %session.save_path.display(), phase = state.phase, "game saved");
                                        "Game saved"
                                    }
                                    Err(err) => {
                                        warn!("save failed: {err:#}");
                                        "Save failed"
                                    }
                                };
                                notice = Some((msg.to_string(), frame + NOTICE_FRAMES));
                            }
                            Some(Hotkey::Load) => {
                                let msg = match load_run(&session.save_path, state.credits) {
                                    Ok(Some(loaded)) => {
                                        info!(phase = loaded.phase, "game loaded");
                                        *state = loaded;
                                        "Game loaded"
                                    }
                                    Ok(None) => "No saved game",
                                    Err(err) => {
                                        warn!("load failed: {err:#}");
                                        "Saved game is unreadable"
                                    }
                                };
                                notice = Some((msg.to_string(), frame + NOTICE_FRAMES));
                            }
                            None => {}
                        }
                    }
                    // Repeat: refresh timestamp so key stays "held"
                    KeyEventKind::Repeat => held.press(code, frame),
                    // Release: remove key immediately (keyboard-enhancement path)
                    KeyEventKind::Release => held.release(code),
                },
                Event::Mouse(MouseEvent { kind, column, row, .. }) if !confirm_quit => {
                    let (x, y) = viewport.to_world(column, row);
                    match kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                            *state = point_player(state, x, y);
                        }
                        MouseEventKind::Down(MouseButton::Left) if state.mouse_control => {
                            *state = point_player(state, x, y);
                            *state = player_shoot(state, 1);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // ── Apply held-key actions every frame ────────────────────────────────
        if !confirm_quit && state.status == RunStatus::Active && !state.paused {
            let numbers: Vec<u8> = state.players.iter().map(|p| p.number).collect();
            for number in numbers {
                // Player one is pointer-driven when mouse control is on.
                if number == 1 && state.mouse_control {
                    continue;
                }
                let keys = player_keys(number);
                for direction in keys.directions(&held, frame) {
                    *state = move_player(state, number, direction);
                }
                let slot = usize::from(number - 1).min(1);
                if fire_cooldown[slot] == 0 && keys.firing(&held, frame) {
                    *state = player_shoot(state, number);
                    fire_cooldown[slot] = FIRE_COOLDOWN;
                }
            }
        }
        for cooldown in &mut fire_cooldown {
            *cooldown = cooldown.saturating_sub(1);
        }
        play_events(out, state, session.assets, &mut track)?;

        if !confirm_quit {
            *state = tick(state, TICK_MS, rng);
            play_events(out, state, session.assets, &mut track)?;
        }

        match state.status {
            RunStatus::Victory { final_score } => {
                return Ok(LoopExit::Finished { won: true, score: final_score });
            }
            RunStatus::Defeat { final_score } => {
                return Ok(LoopExit::Finished { won: false, score: final_score });
            }
            _ => {}
        }

        if notice.as_ref().is_some_and(|(_, until)| frame > *until) {
            notice = None;
        }
        let overlay = Overlay {
            confirm_quit,
            notice: notice.as_ref().map(|(msg, _)| msg.as_str()),
        };
        display::render(out, state, session.assets, overlay)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── End of run ────────────────────────────────────────────────────────────────

/// Name entry and score recording. Returns `true` → back to menu,
/// `false` → quit program.
fn read_name<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    won: bool,
    score: u32,
) -> Result<String> {
    let mut name = String::new();
    loop {
        display::render_name_entry(out, won, score, &name)?;
        match next_key(rx)?.code {
            KeyCode::Enter => return Ok(name),
            KeyCode::Backspace => {
                name.pop();
            }
            KeyCode::Char(c) if !c.is_control() && name.chars().count() < MAX_NAME_LEN => {
                name.push(c);
            }
            _ => {}
        }
    }
}

fn end_of_run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    won: bool,
    score: u32,
    scores: &mut HighScores,
    session: &Session<'_>,
) -> Result<bool> {
    if scores.qualifies(score) {
        let name = read_name(out, rx, won, score)?;
        scores.insert(&name, score);
        match scores.save(&session.score_path) {
            Ok(()) => info!(score, "high score recorded"),
            Err(err) => warn!("could not write high scores: {err:#}"),
        }
    } else {
        debug!(score, "score below the table, skipping name entry");
    }

    let mut confirm_quit = false;
    loop {
        display::render_after_run(out, confirm_quit)?;
        let code = next_key(rx)?.code;
        if confirm_quit {
            if confirms_quit(code) {
                return Ok(false);
            }
            confirm_quit = false;
            continue;
        }
        match code {
            KeyCode::Char('c') | KeyCode::Char('C') => return Ok(true),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => confirm_quit = true,
            _ => {}
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(err) = init_logging(&args.log_file) {
        eprintln!("logging disabled: {err:#}");
    }
    panic::set_hook(Box::new(|info| error!("panic: {info}")));

    let assets = AssetRegistry::load(&args.assets_dir);
    let session = Session {
        assets: &assets,
        save_path: args
            .save_file
            .clone()
            .unwrap_or_else(|| home_file(".space_escape_save.json")),
        score_path: args
            .highscore_file
            .clone()
            .unwrap_or_else(|| home_file(".space_escape_scores.json")),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("failed enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let menu = MenuView {
        credits: args.credits,
        player2: args.player2,
        mouse_control: args.mouse,
        ..MenuView::default()
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        run(&mut out, &rx, menu, &session, &mut rng)
    }));

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    match result {
        Ok(Ok(())) => info!("clean exit"),
        Ok(Err(err)) => {
            error!("game stopped: {err:#}");
            eprintln!("space_escape stopped: {err:#}");
        }
        Err(_) => {
            eprintln!("space_escape crashed; see {}", args.log_file.display());
        }
    }
    Ok(())
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    mut menu: MenuView,
    session: &Session<'_>,
    rng: &mut StdRng,
) -> Result<()> {
    let mut scores = HighScores::load(&session.score_path);

    loop {
        let Some(mut state) = show_menu(out, rx, &mut menu, &scores, session, rng)? else {
            info!("quit from menu");
            break;
        };
        menu.confirm_quit = false;

        let exit = game_loop(out, &mut state, rx, session, rng)?;
        menu.credits = state.credits;

        match exit {
            LoopExit::Quit => break,
            LoopExit::Finished { won, score } => {
                if !end_of_run(out, rx, won, score, &mut scores, session)? {
                    break;
                }
                // Otherwise loop back to the menu
            }
        }
    }
    Ok(())
}
