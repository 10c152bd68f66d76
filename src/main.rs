use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

mod branch_cache;
mod branch_loader;
mod browser;
mod commit;
mod git_ops;
mod ui;

use branch_cache::BranchCache;
use branch_loader::{BranchLoader, BranchResult};
use browser::{BrowserState, Mode};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long checkout results stay on the status line.
const STATUS_TTL: Duration = Duration::from_secs(5);

/// Interval for re-reading HEAD to pick up moves made outside this tool.
const RECONCILE_INTERVAL: Duration = Duration::from_millis(500);

/// Display columns of git output kept for the status line.
const STATUS_MAX_WIDTH: usize = 120;

/// Snapshot of where HEAD points, taken by the watcher task.
#[derive(Debug)]
struct HeadState {
    hash: String,
    /// None while detached (or when the lookup fails, which reads the
    /// same).
    branch: Option<String>,
}

fn read_head_state(repo_root: &Path) -> HeadState {
    HeadState {
        hash: git_ops::head_hash(repo_root).unwrap_or_default(),
        branch: git_ops::current_branch(repo_root),
    }
}

/// Background task polling HEAD to pick up moves made outside this
/// tool. The git reads run on the blocking pool; the event loop only
/// receives finished snapshots, so a slow repository never stalls
/// input handling.
fn spawn_head_watcher(repo_root: PathBuf) -> mpsc::Receiver<HeadState> {
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(RECONCILE_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let root = repo_root.clone();
            let Ok(state) = tokio::task::spawn_blocking(move || read_head_state(&root)).await
            else {
                continue;
            };
            if tx.send(state).await.is_err() {
                return;
            }
        }
    });
    rx
}

struct App {
    repo_root: PathBuf,
    browser: BrowserState,
    cache: Arc<BranchCache>,
    loader: BranchLoader,
    /// Checked-out branch, None while HEAD is detached (or the lookup
    /// fails, which reads the same).
    head_branch: Option<String>,
    status_message: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn new(
        repo_root: PathBuf,
        commits: Vec<commit::Commit>,
        cache: Arc<BranchCache>,
        loader: BranchLoader,
    ) -> Self {
        let head_branch = git_ops::current_branch(&repo_root);
        Self {
            repo_root,
            browser: BrowserState::new(commits),
            cache,
            loader,
            head_branch,
            status_message: None,
            should_quit: false,
        }
    }

    fn set_status<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into().replace('\n', " ");
        let msg = ui::truncate_to_width(msg.trim(), STATUS_MAX_WIDTH);
        self.status_message = Some((msg, Instant::now()));
    }

    fn maybe_expire_status(&mut self) {
        let expired = self
            .status_message
            .as_ref()
            .is_some_and(|(_, t)| t.elapsed() >= STATUS_TTL);
        if expired {
            self.status_message = None;
        }
    }

    /// Submit lazy branch resolution for the rows a redraw can show.
    /// Cache hits are applied inline; misses go to the background
    /// loader. The `branch_loaded` flag keeps a commit from being
    /// submitted twice.
    fn request_visible_resolutions(&mut self) {
        for idx in self.browser.visible_indices() {
            let Some(c) = self.browser.commits.get(idx) else {
                continue;
            };
            if c.is_uncommitted || c.branch_loaded {
                continue;
            }
            let hash = c.hash.clone();
            match self.cache.get(&hash) {
                Some(branch) => {
                    let c = &mut self.browser.commits[idx];
                    c.branch = branch;
                    c.branch_loaded = true;
                }
                None => self.loader.request_resolve(hash),
            }
        }
    }

    fn apply_branch_result(&mut self, result: BranchResult) {
        for c in self.browser.commits.iter_mut() {
            if !c.is_uncommitted && c.hash == result.hash {
                c.branch = result.branch.clone();
                c.branch_loaded = true;
            }
        }
    }

    /// Repoint the HEAD flags from a snapshot. Detects checkouts done
    /// by other processes; new commits and branches still require the
    /// post-checkout rebuild path.
    fn apply_head_state(&mut self, state: HeadState) {
        commit::update_head_flags(&mut self.browser.commits, &state.hash);
        self.head_branch = state.branch;
    }

    /// Synchronous HEAD re-read for right after our own checkout; the
    /// periodic path goes through the watcher task instead.
    fn reconcile_head(&mut self) {
        let state = read_head_state(&self.repo_root);
        self.apply_head_state(state);
    }

    /// Enter on a commit in Browse mode: figure out whether the choice
    /// of branch is unambiguous, and open the right modal.
    fn begin_selection(&mut self) {
        let Some(c) = self.browser.selected().cloned() else {
            return;
        };
        if c.is_uncommitted {
            return;
        }

        if !c.branch.is_empty()
            && git_ops::branch_hash(&self.repo_root, &c.branch).is_ok_and(|tip| tip == c.hash)
        {
            // resolved branch's tip is this commit: nothing to disambiguate
            self.browser.enter_confirm_switch(c.branch);
            return;
        }

        let candidates = git_ops::branches_containing(&self.repo_root, &c.hash);
        self.browser.open_branch_select(candidates);
    }

    /// Enter in BranchSelect: look up the chosen branch's tip so the
    /// confirmation records, and shows, whether the checkout will
    /// detach rather than switch.
    fn confirm_branch_selection(&mut self) {
        let Some(branch) = self.browser.branch_choice().map(str::to_string) else {
            return;
        };
        let tip = git_ops::branch_hash(&self.repo_root, &branch).ok();
        self.browser.confirm_branch_choice(tip.as_deref());
    }

    /// Run the confirmed checkout, then resynchronize: cache cleared,
    /// prefetch re-queued, branch annotations forgotten, HEAD re-read.
    /// On failure the model is left exactly as it was.
    fn execute_confirmed(&mut self) {
        let Some((commit_rec, chosen)) = self.browser.take_confirmed() else {
            return;
        };

        let chosen_tip = chosen
            .as_deref()
            .and_then(|b| git_ops::branch_hash(&self.repo_root, b).ok());
        let plan = git_ops::plan_checkout(chosen.as_deref(), chosen_tip.as_deref(), &commit_rec.hash);

        match git_ops::execute_checkout(&self.repo_root, &plan) {
            Ok(output) => {
                self.cache.invalidate_all();
                commit::clear_branch_annotations(&mut self.browser.commits);
                self.loader.request_prefetch();
                self.reconcile_head();
                if output.is_empty() {
                    self.set_status("Checkout successful");
                } else {
                    self.set_status(format!("Checkout successful: {}", output));
                }
            }
            Err(e) => self.set_status(format!("Checkout failed: {}", e)),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match &self.browser.mode {
            Mode::Confirm { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.execute_confirmed(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.browser.cancel();
                }
                _ => {}
            },
            Mode::BranchSelect { .. } => match key.code {
                KeyCode::Left => self.browser.select_left(),
                KeyCode::Right => self.browser.select_right(),
                KeyCode::Enter => self.confirm_branch_selection(),
                KeyCode::Esc => {
                    self.browser.cancel();
                }
                _ => {}
            },
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Up => self.browser.move_up(),
                KeyCode::Down => self.browser.move_down(),
                KeyCode::PageUp => self.browser.page_up(),
                KeyCode::PageDown => self.browser.page_down(),
                KeyCode::Enter => self.begin_selection(),
                _ => {}
            },
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    if let Some(arg) = env::args().nth(1)
        && (arg == "--version" || arg == "-V")
    {
        println!("gitjump {}", VERSION);
        return Ok(());
    }

    let start_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let repo_root = match git_ops::repo_root(&start_path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("gitjump: not a git repository: {}", e);
            std::process::exit(1);
        }
    };

    let commits = match commit::build_commits(&repo_root) {
        Ok(commits) => commits,
        Err(e) => {
            eprintln!("gitjump: failed to read commit log: {}", e);
            std::process::exit(1);
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let cache = Arc::new(BranchCache::new());
    let (loader, mut branch_rx) = BranchLoader::new(repo_root.clone(), cache.clone());
    loader.request_prefetch();

    let mut app = App::new(repo_root, commits, cache, loader);

    let mut event_stream = EventStream::new();
    let mut head_rx = spawn_head_watcher(app.repo_root.clone());

    while !app.should_quit {
        app.maybe_expire_status();
        terminal.draw(|f| {
            let status = app.status_message.as_ref().map(|(m, _)| m.as_str());
            ui::render(f, &mut app.browser, status, app.head_branch.as_deref());
        })?;
        app.request_visible_resolutions();

        // Model mutations all happen on this task: loader results, HEAD
        // snapshots, and key-driven checkouts cannot interleave.
        tokio::select! {
            Some(result) = branch_rx.recv() => {
                app.apply_branch_result(result);
            }
            Some(state) = head_rx.recv() => {
                app.apply_head_state(state);
            }
            Some(event_result) = event_stream.next() => {
                if let Ok(Event::Key(key)) = event_result
                    && key.kind == KeyEventKind::Press
                {
                    app.handle_key(key);
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}
