use agentchat::api::BackendClient;
use agentchat::app::{run_chat_worker, ChatApp, ChatCommand, StopSignal, WELCOME_MESSAGE};
use agentchat::config::Config;
use agentchat::state::{ChatConversation, ChatStreamUpdate, FeatureFlags};
use agentchat::terminal;
use agentchat::ui::editor::{InputAction, InputEditor};
use agentchat::ui::render::{
    input_visual_rows, render_input, render_question_modal, render_status_line, render_transcript,
    split_chat_layout,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::Clear;
use std::time::Duration;
use tokio::sync::mpsc;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(16);
const PAGE_SCROLL_LINES: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let client = BackendClient::new(&config);
    let conversation = ChatConversation::with_welcome(
        client,
        config.agent_id.clone(),
        FeatureFlags::from_config(&config),
        WELCOME_MESSAGE,
    );

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let stop = StopSignal::default();
    tokio::spawn(run_chat_worker(conversation, command_rx, update_tx, stop.clone()));

    let mut terminal = terminal::setup()?;
    let result = run_ui(&mut terminal, &config, command_tx, update_rx, stop).await;
    terminal::restore()?;
    result
}

async fn run_ui(
    terminal: &mut terminal::TerminalType,
    config: &Config,
    command_tx: mpsc::UnboundedSender<ChatCommand>,
    mut update_rx: mpsc::UnboundedReceiver<ChatStreamUpdate>,
    stop: StopSignal,
) -> Result<()> {
    let mut app = ChatApp::new(config);
    let mut editor = InputEditor::new();
    // None follows the transcript tail; Some(n) is a manual scroll offset.
    let mut manual_scroll: Option<usize> = None;

    loop {
        while let Ok(update) = update_rx.try_recv() {
            app.apply_update(update);
        }

        draw(terminal, &app, &editor, manual_scroll)?;

        if !event::poll(INPUT_POLL_INTERVAL)? {
            continue;
        }
        let ev = event::read()?;

        if app.overlay().is_some() {
            if let Event::Key(key) = ev {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if is_interrupt_key(&key) {
                    break;
                }
                if let Some(command) = handle_overlay_key(&mut app, key) {
                    let _ = command_tx.send(command);
                }
            }
            continue;
        }

        if handle_transcript_scroll(&ev, &mut manual_scroll, app.transcript().len()) {
            continue;
        }

        match editor.apply_event(ev) {
            InputAction::Submit(text) => {
                if !app.is_busy() {
                    manual_scroll = None;
                    app.note_user_message(&text);
                    let _ = command_tx.send(ChatCommand::Send(text));
                }
            }
            InputAction::Interrupt => {
                // Stop the in-flight turn if there is one; otherwise quit.
                if !stop.trigger() {
                    break;
                }
            }
            InputAction::NewChat => {
                stop.trigger();
                app.start_new_chat();
                manual_scroll = None;
                let _ = command_tx.send(ChatCommand::NewChat);
            }
            InputAction::Quit => break,
            InputAction::None => {}
        }
    }

    Ok(())
}

fn draw(
    terminal: &mut terminal::TerminalType,
    app: &ChatApp,
    editor: &InputEditor,
    manual_scroll: Option<usize>,
) -> Result<()> {
    terminal.draw(|frame| {
        let area = frame.area();
        frame.render_widget(Clear, area);

        let input_width = area.width.saturating_sub(2).max(1) as usize;
        let input_rows = input_visual_rows(editor.buffer(), input_width).max(1) as u16;
        let panes = split_chat_layout(area, input_rows);

        let viewport = panes.transcript.height as usize;
        let bottom = app.transcript().len().saturating_sub(viewport);
        let scroll = manual_scroll.unwrap_or(bottom).min(bottom);

        render_status_line(frame, panes.header, &app.status_line());
        render_transcript(frame, panes.transcript, app.transcript(), scroll);
        render_input(frame, panes.input, editor.buffer(), editor.cursor());

        if let Some(view) = app.overlay().and_then(|overlay| overlay.view()) {
            render_question_modal(frame, &view);
        }
    })?;
    Ok(())
}

fn is_interrupt_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn plain_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(ch)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            Some(ch)
        }
        _ => None,
    }
}

fn handle_overlay_key(app: &mut ChatApp, key: KeyEvent) -> Option<ChatCommand> {
    let editing = app
        .overlay()
        .is_some_and(|overlay| overlay.is_editing_custom());

    if editing {
        let overlay = app.overlay_mut()?;
        match key.code {
            KeyCode::Esc | KeyCode::Enter => overlay.stop_editing(),
            KeyCode::Backspace => overlay.backspace(),
            _ => {
                if let Some(ch) = plain_char(&key) {
                    overlay.input_char(ch);
                }
            }
        }
        return None;
    }

    if key.code == KeyCode::Enter {
        let (tool_use_id, answers) = app.take_overlay_submission()?;
        return Some(ChatCommand::Answer {
            tool_use_id,
            answers,
        });
    }

    let overlay = app.overlay_mut()?;
    match key.code {
        KeyCode::Up => overlay.move_up(),
        KeyCode::Down => overlay.move_down(),
        KeyCode::Char(' ') => overlay.toggle_focused(),
        KeyCode::Tab => overlay.next_question(),
        _ => {}
    }
    None
}

/// PageUp/PageDown scroll the transcript; any scroll to the bottom resumes
/// following new output.
fn handle_transcript_scroll(
    ev: &Event,
    manual_scroll: &mut Option<usize>,
    transcript_lines: usize,
) -> bool {
    let Event::Key(key) = ev else {
        return false;
    };
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::PageUp => {
            let current = manual_scroll.unwrap_or(transcript_lines);
            *manual_scroll = Some(current.saturating_sub(PAGE_SCROLL_LINES));
            true
        }
        KeyCode::PageDown => {
            if let Some(current) = *manual_scroll {
                let next = current + PAGE_SCROLL_LINES;
                *manual_scroll = if next >= transcript_lines {
                    None
                } else {
                    Some(next)
                };
            }
            true
        }
        _ => false,
    }
}
