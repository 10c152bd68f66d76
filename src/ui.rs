//! Rendering for the commit list and the two-row status area.
//!
//! Pure view code: reads the browser state, writes widgets. The only
//! state it touches is the page height, which the navigation keys need
//! before the next event is handled.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthChar;

use crate::browser::{BrowserState, Mode};
use crate::commit::Commit;

pub fn truncate_to_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut wsum = 0usize;

    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if wsum + w > width {
            break;
        }
        out.push(ch);
        wsum += w;
        if wsum >= width {
            break;
        }
    }

    out
}

/// One list row: `shorthash - date - author - message [branch]`.
pub fn commit_row(commit: &Commit) -> String {
    let mut row = format!(
        "{} - {} - {} - {}",
        commit.short_hash(),
        commit.date,
        commit.author,
        commit.message
    );
    if !commit.branch.is_empty() {
        row.push_str(&format!(" [{}]", commit.branch));
    }
    row
}

fn row_style(commit: &Commit, is_cursor: bool) -> Style {
    if is_cursor {
        if commit.is_uncommitted {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::Black).bg(Color::White)
        }
    } else if commit.is_head || commit.is_uncommitted {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

pub fn render(
    f: &mut Frame,
    browser: &mut BrowserState,
    status: Option<&str>,
    head_branch: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(f.area());

    browser.set_page_height(chunks[0].height as usize);
    render_commit_list(f, browser, chunks[0]);
    render_status(f, browser, status, head_branch, chunks[1]);
}

fn render_commit_list(f: &mut Frame, browser: &BrowserState, area: Rect) {
    let width = area.width as usize;
    let end = (browser.scroll + browser.page_height).min(browser.commits.len());

    let lines: Vec<Line> = (browser.scroll..end)
        .map(|i| {
            let commit = &browser.commits[i];
            let row = truncate_to_width(&commit_row(commit), width);
            Line::styled(row, row_style(commit, i == browser.cursor))
        })
        .collect();

    f.render_widget(Paragraph::new(lines), area);
}

fn render_status(
    f: &mut Frame,
    browser: &BrowserState,
    status: Option<&str>,
    head_branch: Option<&str>,
    area: Rect,
) {
    let prompt = match &browser.mode {
        Mode::BranchSelect { .. } => branch_select_line(browser),
        Mode::Confirm { branch, detach } => Line::raw(confirm_prompt(
            browser.selected(),
            branch.as_deref(),
            *detach,
        )),
        Mode::Browse => match status {
            Some(msg) => Line::styled(msg.to_string(), Style::default().fg(Color::Yellow)),
            None => Line::raw(browse_summary(browser, head_branch)),
        },
    };

    let hints = match &browser.mode {
        Mode::Browse => "Up/Down move  PgUp/PgDn page  Enter checkout  Esc/q quit",
        Mode::BranchSelect { .. } => "Left/Right choose branch  Enter confirm  Esc cancel",
        Mode::Confirm { .. } => "y confirm  n/Esc cancel",
    };

    let lines = vec![
        prompt,
        Line::styled(hints, Style::default().fg(Color::DarkGray)),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn branch_select_line(browser: &BrowserState) -> Line<'static> {
    let Mode::BranchSelect {
        candidates,
        selected,
    } = &browser.mode
    else {
        return Line::raw("");
    };

    let mut spans = vec![Span::raw("Checkout branch: ")];
    for (i, name) in candidates.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if i == *selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(name.clone(), style));
    }
    Line::from(spans)
}

pub fn confirm_prompt(commit: Option<&Commit>, branch: Option<&str>, detach: bool) -> String {
    match (commit, branch) {
        (_, Some(branch)) if !detach => format!("Checkout branch '{}'? [y/n]", branch),
        (Some(commit), _) => format!(
            "Checkout commit {}? (detached HEAD) [y/n]",
            commit.short_hash()
        ),
        (None, _) => String::new(),
    }
}

pub fn browse_summary(browser: &BrowserState, head_branch: Option<&str>) -> String {
    let branch_info = match browser.selected() {
        Some(c) if !c.branch.is_empty() => format!(" (Branch: {})", c.branch),
        _ => String::new(),
    };
    format!(
        "Total commits: {}{}  HEAD: {}",
        browser.commits.len(),
        branch_info,
        head_branch.unwrap_or("detached")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(branch: &str) -> Commit {
        Commit {
            hash: "0123456789abcdef".to_string(),
            author: "Test User".to_string(),
            date: "2026-08-25 10:22:04".to_string(),
            message: "a message".to_string(),
            branch: branch.to_string(),
            branch_loaded: !branch.is_empty(),
            is_head: false,
            is_uncommitted: false,
        }
    }

    #[test]
    fn test_commit_row_with_and_without_branch() {
        assert_eq!(
            commit_row(&commit("main")),
            "0123456 - 2026-08-25 10:22:04 - Test User - a message [main]"
        );
        assert_eq!(
            commit_row(&commit("")),
            "0123456 - 2026-08-25 10:22:04 - Test User - a message"
        );
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello", 0), "");
        // wide characters count as two columns
        assert_eq!(truncate_to_width("日本語", 4), "日本");
    }

    #[test]
    fn test_browse_summary_reports_head_state() {
        let mut b = BrowserState::new(vec![commit("main")]);
        assert_eq!(
            browse_summary(&b, Some("main")),
            "Total commits: 1 (Branch: main)  HEAD: main"
        );
        b.commits[0].branch.clear();
        assert_eq!(browse_summary(&b, None), "Total commits: 1  HEAD: detached");
    }

    #[test]
    fn test_confirm_prompt_variants() {
        let c = commit("main");
        assert_eq!(
            confirm_prompt(Some(&c), Some("main"), false),
            "Checkout branch 'main'? [y/n]"
        );
        assert_eq!(
            confirm_prompt(Some(&c), None, true),
            "Checkout commit 0123456? (detached HEAD) [y/n]"
        );
        // a chosen branch whose tip moved still detaches
        assert_eq!(
            confirm_prompt(Some(&c), Some("main"), true),
            "Checkout commit 0123456? (detached HEAD) [y/n]"
        );
    }
}
