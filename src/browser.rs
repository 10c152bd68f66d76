//! Cursor, scroll window, and modal interaction state.
//!
//! Three modes: plain browsing, branch disambiguation when a commit is
//! contained in several branches, and the final yes/no confirmation.
//! Esc pops exactly one mode level; only from Browse does it quit.

use crate::commit::Commit;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Choosing between candidate branches that contain the selected
    /// commit. No wraparound.
    BranchSelect {
        candidates: Vec<String>,
        selected: usize,
    },
    /// Pending checkout. `branch` is the chosen branch for an attached
    /// switch; `detach` records that no branch candidate exists and the
    /// checkout will leave HEAD detached.
    Confirm {
        branch: Option<String>,
        detach: bool,
    },
}

pub struct BrowserState {
    pub commits: Vec<Commit>,
    pub cursor: usize,
    pub scroll: usize,
    /// Rows the list pane can show; refreshed by the renderer each
    /// frame before navigation keys are handled.
    pub page_height: usize,
    pub mode: Mode,
}

impl BrowserState {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self {
            commits,
            cursor: 0,
            scroll: 0,
            page_height: 20,
            mode: Mode::Browse,
        }
    }

    pub fn selected(&self) -> Option<&Commit> {
        self.commits.get(self.cursor)
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.scroll_to_cursor();
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.commits.len() {
            self.cursor += 1;
        }
        self.scroll_to_cursor();
    }

    pub fn page_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(self.page_height.max(1));
        self.scroll_to_cursor();
    }

    pub fn page_down(&mut self) {
        if self.commits.is_empty() {
            return;
        }
        let last = self.commits.len() - 1;
        self.cursor = (self.cursor + self.page_height.max(1)).min(last);
        self.scroll_to_cursor();
    }

    /// Slide the window minimally so the cursor is inside
    /// `[scroll, scroll + page_height)`. Never re-centers.
    fn scroll_to_cursor(&mut self) {
        let page = self.page_height.max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + page {
            self.scroll = self.cursor + 1 - page;
        }
    }

    pub fn set_page_height(&mut self, height: usize) {
        self.page_height = height.max(1);
        self.scroll_to_cursor();
    }

    /// Indices currently worth resolving eagerly: the visible window
    /// plus the cursor row, which may sit just outside it mid-jump.
    pub fn visible_indices(&self) -> Vec<usize> {
        let end = (self.scroll + self.page_height).min(self.commits.len());
        let mut indices: Vec<usize> = (self.scroll..end).collect();
        if self.cursor < self.commits.len() && !indices.contains(&self.cursor) {
            indices.push(self.cursor);
        }
        indices
    }

    /// Skip disambiguation: the selected commit is the tip of its
    /// already-resolved branch.
    pub fn enter_confirm_switch(&mut self, branch: String) {
        self.mode = Mode::Confirm {
            branch: Some(branch),
            detach: false,
        };
    }

    /// Open disambiguation over the containment candidates; with no
    /// candidates the checkout can only detach, so go straight to
    /// confirmation.
    pub fn open_branch_select(&mut self, candidates: Vec<String>) {
        if candidates.is_empty() {
            self.mode = Mode::Confirm {
                branch: None,
                detach: true,
            };
        } else {
            self.mode = Mode::BranchSelect {
                candidates,
                selected: 0,
            };
        }
    }

    pub fn select_left(&mut self) {
        if let Mode::BranchSelect { selected, .. } = &mut self.mode {
            *selected = selected.saturating_sub(1);
        }
    }

    pub fn select_right(&mut self) {
        if let Mode::BranchSelect {
            candidates,
            selected,
        } = &mut self.mode
            && *selected + 1 < candidates.len()
        {
            *selected += 1;
        }
    }

    /// Candidate currently highlighted in BranchSelect.
    pub fn branch_choice(&self) -> Option<&str> {
        match &self.mode {
            Mode::BranchSelect {
                candidates,
                selected,
            } => candidates.get(*selected).map(String::as_str),
            _ => None,
        }
    }

    /// Commit the highlighted candidate and move on to confirmation.
    /// `chosen_tip` is the candidate branch's current tip hash: when it
    /// is not the selected commit the checkout can only detach, and the
    /// confirmation prompt must say so before the user agrees.
    pub fn confirm_branch_choice(&mut self, chosen_tip: Option<&str>) {
        let Mode::BranchSelect {
            candidates,
            selected,
        } = &self.mode
        else {
            return;
        };
        let branch = candidates.get(*selected).cloned();
        let detach =
            !chosen_tip.is_some_and(|tip| self.selected().is_some_and(|c| c.hash == tip));
        self.mode = Mode::Confirm { branch, detach };
    }

    /// The pending checkout, as (commit, chosen branch), cleared back
    /// to Browse. None when not confirming or when the selection is the
    /// uncommitted pseudo-commit, which is never checkoutable.
    pub fn take_confirmed(&mut self) -> Option<(Commit, Option<String>)> {
        let Mode::Confirm { branch, .. } = &self.mode else {
            return None;
        };
        let branch = branch.clone();
        self.mode = Mode::Browse;

        let commit = self.selected()?.clone();
        if commit.is_uncommitted {
            return None;
        }
        Some((commit, branch))
    }

    /// One level of undo. Returns false when already in Browse, i.e.
    /// the cancel should fall through to quitting the process.
    pub fn cancel(&mut self) -> bool {
        match self.mode {
            Mode::Browse => false,
            _ => {
                self.mode = Mode::Browse;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::UNCOMMITTED_HASH;

    fn commit(hash: &str) -> Commit {
        Commit {
            hash: hash.to_string(),
            author: "a".to_string(),
            date: "2026-08-25 10:00:00".to_string(),
            message: "m".to_string(),
            branch: String::new(),
            branch_loaded: false,
            is_head: false,
            is_uncommitted: false,
        }
    }

    fn browser(n: usize) -> BrowserState {
        let commits = (0..n).map(|i| commit(&format!("c{}", i))).collect();
        let mut b = BrowserState::new(commits);
        b.page_height = 5;
        b
    }

    #[test]
    fn test_cursor_clamps_at_both_ends() {
        let mut b = browser(3);
        b.move_up();
        assert_eq!(b.cursor, 0);
        b.move_down();
        b.move_down();
        b.move_down();
        assert_eq!(b.cursor, 2);
    }

    #[test]
    fn test_page_jumps_land_exactly_on_bounds() {
        let mut b = browser(12);
        b.page_down();
        assert_eq!(b.cursor, 5);
        b.page_down();
        assert_eq!(b.cursor, 10);
        b.page_down();
        assert_eq!(b.cursor, 11);
        b.page_up();
        assert_eq!(b.cursor, 6);
        b.page_up();
        b.page_up();
        assert_eq!(b.cursor, 0);
    }

    #[test]
    fn test_empty_list_navigation_is_inert() {
        let mut b = browser(0);
        b.move_down();
        b.page_down();
        b.page_up();
        assert_eq!(b.cursor, 0);
        assert!(b.selected().is_none());
    }

    #[test]
    fn test_scroll_window_always_contains_cursor() {
        let mut b = browser(40);
        for _ in 0..23 {
            b.move_down();
        }
        assert!(b.cursor >= b.scroll && b.cursor < b.scroll + b.page_height);
        // jumped down: window slid just enough, bottom edge at cursor
        assert_eq!(b.scroll, b.cursor + 1 - b.page_height);

        b.page_up();
        assert!(b.cursor >= b.scroll && b.cursor < b.scroll + b.page_height);
        // moved up past the top edge: cursor pinned at top
        assert_eq!(b.scroll, b.cursor);

        b.page_down();
        b.page_down();
        b.page_down();
        b.page_down();
        b.page_down();
        assert_eq!(b.cursor, 39);
        assert!(b.cursor >= b.scroll && b.cursor < b.scroll + b.page_height);
    }

    #[test]
    fn test_scroll_never_recenters_within_window() {
        let mut b = browser(40);
        for _ in 0..10 {
            b.move_down();
        }
        let scroll = b.scroll;
        b.move_up();
        // cursor still inside the window: offset untouched
        assert_eq!(b.scroll, scroll);
    }

    #[test]
    fn test_visible_indices_include_offscreen_cursor() {
        let mut b = browser(40);
        b.cursor = 20;
        b.scroll = 0;
        let indices = b.visible_indices();
        assert_eq!(&indices[..5], &[0, 1, 2, 3, 4]);
        assert!(indices.contains(&20));
    }

    #[test]
    fn test_branch_select_clamps_without_wraparound() {
        let mut b = browser(3);
        b.open_branch_select(vec!["main".to_string(), "feature".to_string()]);
        b.select_left();
        assert!(matches!(&b.mode, Mode::BranchSelect { selected: 0, .. }));
        b.select_right();
        b.select_right();
        b.select_right();
        assert!(matches!(&b.mode, Mode::BranchSelect { selected: 1, .. }));
    }

    #[test]
    fn test_empty_candidates_go_straight_to_detached_confirm() {
        let mut b = browser(3);
        b.open_branch_select(Vec::new());
        assert_eq!(
            b.mode,
            Mode::Confirm {
                branch: None,
                detach: true
            }
        );
    }

    #[test]
    fn test_branch_choice_at_tip_confirms_attached() {
        let mut b = browser(3);
        b.open_branch_select(vec!["main".to_string(), "feature".to_string()]);
        b.select_right();
        assert_eq!(b.branch_choice(), Some("feature"));
        // the chosen branch's tip is the selected commit
        b.confirm_branch_choice(Some("c0"));
        assert_eq!(
            b.mode,
            Mode::Confirm {
                branch: Some("feature".to_string()),
                detach: false
            }
        );
    }

    #[test]
    fn test_branch_choice_below_tip_confirms_detached() {
        let mut b = browser(3);
        b.open_branch_select(vec!["main".to_string()]);
        // the branch has moved past the selected commit, so the
        // checkout will detach and the confirmation must carry that
        b.confirm_branch_choice(Some("c9"));
        assert_eq!(
            b.mode,
            Mode::Confirm {
                branch: Some("main".to_string()),
                detach: true
            }
        );

        // unresolvable tip likewise falls back to the detached path
        b.open_branch_select(vec!["main".to_string()]);
        b.confirm_branch_choice(None);
        assert!(matches!(&b.mode, Mode::Confirm { detach: true, .. }));
    }

    #[test]
    fn test_cancel_pops_exactly_one_level() {
        let mut b = browser(3);
        b.open_branch_select(vec!["main".to_string()]);
        assert!(b.cancel());
        assert_eq!(b.mode, Mode::Browse);
        // a second cancel falls through to quit
        assert!(!b.cancel());

        b.enter_confirm_switch("main".to_string());
        assert!(b.cancel());
        assert_eq!(b.mode, Mode::Browse);
    }

    #[test]
    fn test_take_confirmed_returns_pending_checkout() {
        let mut b = browser(3);
        b.move_down();
        b.enter_confirm_switch("main".to_string());
        let (commit, branch) = b.take_confirmed().unwrap();
        assert_eq!(commit.hash, "c1");
        assert_eq!(branch.as_deref(), Some("main"));
        assert_eq!(b.mode, Mode::Browse);
        // not confirming anymore
        assert!(b.take_confirmed().is_none());
    }

    #[test]
    fn test_pseudo_commit_is_never_checkoutable() {
        let mut pseudo = commit(UNCOMMITTED_HASH);
        pseudo.is_uncommitted = true;
        let mut b = BrowserState::new(vec![pseudo, commit("c1")]);
        b.mode = Mode::Confirm {
            branch: None,
            detach: true,
        };
        assert!(b.take_confirmed().is_none());
        assert_eq!(b.mode, Mode::Browse);
    }
}
