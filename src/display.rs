//! Rendering layer. All terminal output lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! game state. No game logic is performed; this module only translates
//! world coordinates into terminal cells and state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use space_escape::assets::{powerup_key, AssetRegistry, Sprite};
use space_escape::constants::{phase_target, BULLET_LIMIT, HEIGHT, WIDTH};
use space_escape::entities::{
    Boss, BossPart, Player, PowerUpKind, Rect, RunState, RunStatus,
};
use space_escape::highscores::HighScores;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD: Color = Color::White;
const C_HUD_SCORE: Color = Color::Yellow;
const C_PLAYER1: Color = Color::White;
const C_PLAYER2: Color = Color::Green;
const C_SHIELD: Color = Color::Cyan;
const C_METEOR: Color = Color::Red;
const C_BULLET_PLAYER: Color = Color::Yellow;
const C_BULLET_BOSS: Color = Color::Magenta;
const C_BONUS_LIFE: Color = Color::Green;
const C_BONUS_SHOT: Color = Color::Yellow;
const C_BONUS_TP: Color = Color::Cyan;
const C_BOSS: Color = Color::Grey;
const C_HINT: Color = Color::DarkGrey;

type IoResult = std::io::Result<()>;

// ── World → cell mapping ──────────────────────────────────────────────────────

/// Terminal region the 800x600 world is scaled onto: rows 2..h-3 and
/// columns 1..w-2, inside the border.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

struct CellBox {
    col: i32,
    row: i32,
    cols: i32,
    rows: i32,
}

impl Viewport {
    fn left(&self) -> i32 {
        1
    }

    fn right(&self) -> i32 {
        self.width as i32 - 2
    }

    fn top(&self) -> i32 {
        2
    }

    fn bottom(&self) -> i32 {
        self.height as i32 - 3
    }

    fn inner_w(&self) -> f32 {
        (self.right() - self.left() + 1).max(1) as f32
    }

    fn inner_h(&self) -> f32 {
        (self.bottom() - self.top() + 1).max(1) as f32
    }

    fn cell_box(&self, rect: &Rect) -> CellBox {
        let sx = self.inner_w() / WIDTH;
        let sy = self.inner_h() / HEIGHT;
        let col = (rect.x * sx).floor() as i32;
        let row = (rect.y * sy).floor() as i32;
        let cols = ((rect.right() * sx).ceil() as i32 - col).max(1);
        let rows = ((rect.bottom() * sy).ceil() as i32 - row).max(1);
        CellBox {
            col: col + self.left(),
            row: row + self.top(),
            cols,
            rows,
        }
    }

    /// Terminal cell → world point (centre of the cell).
    pub fn to_world(&self, col: u16, row: u16) -> (f32, f32) {
        let cx = (col as i32 - self.left()) as f32 + 0.5;
        let cy = (row as i32 - self.top()) as f32 + 0.5;
        (cx * WIDTH / self.inner_w(), cy * HEIGHT / self.inner_h())
    }

    /// Print `text` starting at `(col, row)`, dropping anything outside the
    /// play area.
    fn put<W: Write>(&self, out: &mut W, col: i32, row: i32, text: &str) -> IoResult {
        if row < self.top() || row > self.bottom() {
            return Ok(());
        }
        let visible: String = text
            .chars()
            .enumerate()
            .filter(|(i, _)| (self.left()..=self.right()).contains(&(col + *i as i32)))
            .map(|(_, ch)| ch)
            .collect();
        if visible.is_empty() {
            return Ok(());
        }
        out.queue(cursor::MoveTo(col.max(self.left()) as u16, row as u16))?;
        out.queue(Print(visible))?;
        Ok(())
    }
}

/// Extra things drawn over the play field.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overlay<'a> {
    pub confirm_quit: bool,
    pub notice: Option<&'a str>,
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    state: &RunState,
    assets: &AssetRegistry,
    overlay: Overlay<'_>,
) -> IoResult {
    let (width, height) = terminal::size()?;
    let vp = Viewport { width, height };
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &vp)?;
    draw_hud(out, &vp, state)?;

    match state.status {
        RunStatus::Countdown { remaining_ms } => {
            let secs = remaining_ms.div_ceil(1000);
            draw_banner(out, &vp, &[(format!("Ready? {secs}"), Color::Yellow)])?;
        }
        _ => draw_field(out, &vp, state, assets)?,
    }

    if state.paused {
        draw_banner(out, &vp, &[("PAUSED - press P to resume".to_string(), Color::White)])?;
    }
    if overlay.confirm_quit {
        draw_confirm_quit(out, &vp)?;
    } else if let Some(notice) = overlay.notice {
        out.queue(cursor::MoveTo(1, 1))?;
        out.queue(style::SetForegroundColor(Color::Cyan))?;
        out.queue(Print(notice))?;
    }

    draw_controls_hint(out, &vp, state.credits)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, vp: &Viewport) -> IoResult {
    let w = vp.width as usize;
    let h = vp.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    // Row 1: top bar
    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    // Row h-2: bottom bar
    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    // Side walls
    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(vp.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn player_status(p: &Player) -> String {
    format!(
        "P{} Lives:{} Shots:{} Bullets:{}/{}",
        p.number,
        p.lives,
        p.shot_level,
        p.bullets.len(),
        BULLET_LIMIT
    )
}

fn draw_hud<W: Write>(out: &mut W, vp: &Viewport, state: &RunState) -> IoResult {
    // Players, left
    let players: Vec<String> = state.players.iter().map(player_status).collect();
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(Print(players.join("  ")))?;

    // Phase and score, right
    let target = match phase_target(state.phase) {
        Some(t) => t.to_string(),
        None => "BOSS".to_string(),
    };
    let right = format!(
        "Phase {}  Score {}/{}  T{:>3}s",
        state.phase,
        state.phase_score,
        target,
        state.phase_elapsed_ms() / 1000
    );
    let rx = vp.width.saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(&right))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_sprite<W: Write>(
    out: &mut W,
    vp: &Viewport,
    rect: &Rect,
    sprite: &Sprite,
    fill: char,
    color: Color,
) -> IoResult {
    let b = vp.cell_box(rect);
    out.queue(style::SetForegroundColor(color))?;

    if sprite.placeholder {
        // Missing art: a solid block the size of the hit box.
        let line: String = std::iter::repeat(fill).take(b.cols as usize).collect();
        for r in 0..b.rows {
            vp.put(out, b.col, b.row + r, &line)?;
        }
    } else {
        // Centre the sprite on the hit box.
        let col = b.col + (b.cols - sprite.width() as i32) / 2;
        let row = b.row + (b.rows - sprite.height() as i32) / 2;
        for (i, line) in sprite.lines.iter().enumerate() {
            vp.put(out, col, row + i as i32, line)?;
        }
    }
    Ok(())
}

fn draw_field<W: Write>(
    out: &mut W,
    vp: &Viewport,
    state: &RunState,
    assets: &AssetRegistry,
) -> IoResult {
    for meteor in &state.meteors {
        draw_sprite(out, vp, &meteor.rect, assets.image("meteor"), '▓', C_METEOR)?;
    }

    for powerup in &state.powerups {
        let (fill, color) = match powerup.kind {
            PowerUpKind::Life => ('♥', C_BONUS_LIFE),
            PowerUpKind::ShotBoost => ('★', C_BONUS_SHOT),
            PowerUpKind::TeleportShield => ('◆', C_BONUS_TP),
        };
        let sprite = assets.image(powerup_key(powerup.kind));
        draw_sprite(out, vp, &powerup.rect, sprite, fill, color)?;
    }

    for player in state.players.iter().filter(|p| p.is_alive()) {
        draw_player(out, vp, player, assets)?;
        for bullet in &player.bullets {
            draw_sprite(out, vp, &bullet.rect, assets.image("bullet"), '║', C_BULLET_PLAYER)?;
        }
    }

    if let Some(boss) = &state.boss {
        draw_boss(out, vp, boss, assets)?;
    }
    Ok(())
}

fn draw_player<W: Write>(
    out: &mut W,
    vp: &Viewport,
    player: &Player,
    assets: &AssetRegistry,
) -> IoResult {
    let (key, color) = if player.number == 2 {
        ("player2", C_PLAYER2)
    } else {
        ("player1", C_PLAYER1)
    };

    if player.is_invulnerable() {
        let b = vp.cell_box(&player.rect);
        out.queue(style::SetForegroundColor(C_SHIELD))?;
        for r in 0..b.rows {
            vp.put(out, b.col - 1, b.row + r, "(")?;
            vp.put(out, b.col + b.cols, b.row + r, ")")?;
        }
        // Blink while shielded.
        if (player.invulnerable_ms / 120) % 2 == 0 {
            return Ok(());
        }
    }

    draw_sprite(out, vp, &player.rect, assets.image(key), '▲', color)
}

fn draw_boss<W: Write>(
    out: &mut W,
    vp: &Viewport,
    boss: &Boss,
    assets: &AssetRegistry,
) -> IoResult {
    draw_sprite(out, vp, &boss.rect, assets.image("boss"), '█', C_BOSS)?;

    // Total HP bar above the body.
    let b = vp.cell_box(&boss.rect);
    let bar_w = (b.cols + 8).max(10);
    let filled = if boss.max_total_hp() > 0 {
        (bar_w as u32 * boss.total_hp() / boss.max_total_hp()) as usize
    } else {
        0
    };
    let bar_col = b.col + b.cols / 2 - bar_w / 2;
    out.queue(style::SetForegroundColor(Color::Green))?;
    vp.put(out, bar_col, b.row - 2, &"█".repeat(filled))?;
    out.queue(style::SetForegroundColor(Color::DarkRed))?;
    vp.put(
        out,
        bar_col + filled as i32,
        b.row - 2,
        &"░".repeat(bar_w as usize - filled),
    )?;

    let parts = format!(
        "L{} C{} R{}",
        boss.hp(BossPart::Left),
        boss.hp(BossPart::Core),
        boss.hp(BossPart::Right)
    );
    out.queue(style::SetForegroundColor(C_HINT))?;
    vp.put(out, b.col + (b.cols - parts.len() as i32) / 2, b.row - 1, &parts)?;

    for proj in &boss.projectiles {
        draw_sprite(out, vp, &proj.rect, &Sprite::placeholder(1, 1), '●', C_BULLET_BOSS)?;
    }
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

/// Centred block of lines in the middle of the screen.
fn draw_banner<W: Write>(out: &mut W, vp: &Viewport, lines: &[(String, Color)]) -> IoResult {
    let cx = vp.width / 2;
    let start_row = (vp.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}

fn draw_confirm_quit<W: Write>(out: &mut W, vp: &Viewport) -> IoResult {
    draw_banner(
        out,
        vp,
        &[
            ("╔══════════════════════════════╗".to_string(), Color::Red),
            ("║  Press ESC again to quit     ║".to_string(), Color::Red),
            ("║  any other key to continue   ║".to_string(), Color::Red),
            ("╚══════════════════════════════╝".to_string(), Color::Red),
        ],
    )
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, vp: &Viewport, credits: u32) -> IoResult {
    out.queue(cursor::MoveTo(1, vp.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(
        "P1 ←↑→↓ SPACE  P2 WASD F  P pause  F1 save  F2 load  2 join  M mouse  ESC quit",
    ))?;

    let credit_text = format!("CREDIT(S): {}", credits);
    let col = vp
        .width
        .saturating_sub(credit_text.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(col, vp.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(Print(credit_text))?;
    Ok(())
}

// ── Menu ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct MenuView {
    pub credits: u32,
    pub player2: bool,
    pub mouse_control: bool,
    pub show_scores: bool,
    pub confirm_quit: bool,
    pub notice: Option<String>,
}

pub fn render_menu<W: Write>(out: &mut W, menu: &MenuView, scores: &HighScores) -> IoResult {
    let (width, height) = terminal::size()?;
    let vp = Viewport { width, height };
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let on_off = |flag: bool| if flag { "ON" } else { "OFF" };
    let mut lines: Vec<(String, Color)> = vec![
        ("★  SPACE  ESCAPE  ★".to_string(), Color::Cyan),
        (String::new(), Color::White),
        ("C : insert coin      ENTER : start (1 credit)".to_string(), Color::White),
        ("H : high scores      L : load saved game".to_string(), Color::White),
        (
            format!(
                "2 : player two [{}]   M : mouse for P1 [{}]",
                on_off(menu.player2),
                on_off(menu.mouse_control)
            ),
            Color::White,
        ),
        ("Q : quit".to_string(), Color::DarkGrey),
        (String::new(), Color::White),
        (format!("CREDIT(S): {}", menu.credits), Color::Yellow),
        (format!("HIGH SCORE: {}", scores.best()), Color::Yellow),
    ];

    if let Some(notice) = &menu.notice {
        lines.push((notice.clone(), Color::Red));
    }

    if menu.show_scores {
        lines.push((String::new(), Color::White));
        lines.push(("Top Scores:".to_string(), Color::Yellow));
        if scores.entries().is_empty() {
            lines.push(("(none yet)".to_string(), Color::DarkGrey));
        }
        for (i, entry) in scores.entries().iter().enumerate() {
            lines.push((
                format!("{:>2}. {:<16} {:>6}", i + 1, entry.name, entry.score),
                Color::White,
            ));
        }
    }

    draw_banner(out, &vp, &lines)?;
    if menu.confirm_quit {
        draw_confirm_quit(out, &vp)?;
    }

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── End of run ────────────────────────────────────────────────────────────────

pub fn render_name_entry<W: Write>(out: &mut W, won: bool, score: u32, name: &str) -> IoResult {
    let (width, height) = terminal::size()?;
    let vp = Viewport { width, height };
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (title, color) = if won {
        ("╔═══  YOU WIN!  ═══╗", Color::Green)
    } else {
        ("╔═══  GAME OVER  ═══╗", Color::Red)
    };
    draw_banner(
        out,
        &vp,
        &[
            (title.to_string(), color),
            (format!("Final Score: {:>6}", score), Color::Yellow),
            (String::new(), Color::White),
            ("Type your name and press ENTER:".to_string(), Color::White),
            (format!("> {}_", name), Color::Cyan),
        ],
    )?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

pub fn render_after_run<W: Write>(out: &mut W, confirm_quit: bool) -> IoResult {
    let (width, height) = terminal::size()?;
    let vp = Viewport { width, height };
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    draw_banner(
        out,
        &vp,
        &[
            ("Game over.".to_string(), Color::White),
            ("C - back to menu   Q - quit".to_string(), Color::White),
        ],
    )?;
    if confirm_quit {
        draw_confirm_quit(out, &vp)?;
    }
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}
