use anyhow::{Context, Result, anyhow, bail};
use blockpage_config::Config;
use blockpage_engine::editing::{
    Cmd, DEFAULT_MAX_DISPLAY_DEPTH, Direction as MoveDirection, InsertTarget, OutlineRow,
    PageEditor, Patch,
};
use blockpage_engine::io::{FilePageStore, PageRepository};
use blockpage_engine::models::{BlockId, COLUMNS_TYPE, ColumnLayout};
use blockpage_engine::registry::{self, BlockTypeRegistry};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::Path,
    process,
};

/// Where a page is loaded from and saved back to.
struct PageSource {
    store: FilePageStore,
    slug: String,
}

impl PageSource {
    /// `page` is either a path to a `.json` page file or the slug of a page
    /// in the configured pages directory.
    fn resolve(page: &str, config: Option<&Config>) -> Result<Self> {
        let path = Path::new(page);
        if path.extension().is_some_and(|ext| ext == "json") {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let slug = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| anyhow!("page file name is not valid UTF-8: {page}"))?;
            return Ok(Self {
                store: FilePageStore::open(dir)?,
                slug: slug.to_string(),
            });
        }

        let config = config.ok_or_else(|| {
            anyhow!(
                "'{page}' is not a .json file and no config file was found at {}",
                Config::config_path().display()
            )
        })?;
        Ok(Self {
            store: FilePageStore::open(&config.pages_path)?,
            slug: page.to_string(),
        })
    }

    fn open(&self, max_display_depth: usize) -> Result<PageEditor> {
        let page = self
            .store
            .get(&self.slug)
            .with_context(|| format!("loading page '{}'", self.slug))?;
        Ok(PageEditor::open(page)?.with_max_display_depth(max_display_depth))
    }

    fn save(&self, editor: &PageEditor) -> Result<()> {
        let page = editor.page();
        if page.slug != self.slug {
            log::warn!(
                "page slug '{}' differs from '{}', saving under the new slug",
                page.slug,
                self.slug
            );
        }
        self.store.put(&page)?;
        Ok(())
    }
}

struct App {
    source: PageSource,
    editor: PageEditor,
    registry: &'static BlockTypeRegistry,
    rows: Vec<OutlineRow>,
    list_state: ListState,
    saved_version: u64,
    status: String,
    confirm_quit: bool,
    /// A layout change that would discard filled columns, waiting for a
    /// second `l`.
    pending_layout: Option<(BlockId, ColumnLayout)>,
}

impl App {
    fn new(source: PageSource, max_display_depth: usize) -> Result<Self> {
        let editor = source.open(max_display_depth)?;
        let saved_version = editor.version();

        let mut app = Self {
            source,
            editor,
            registry: registry::global(),
            rows: Vec::new(),
            list_state: ListState::default(),
            saved_version,
            status: String::new(),
            confirm_quit: false,
            pending_layout: None,
        };
        app.refresh_rows();

        // Select first block if available
        if !app.rows.is_empty() {
            app.select_index(0);
        }

        Ok(app)
    }

    fn is_dirty(&self) -> bool {
        self.editor.version() != self.saved_version
    }

    /// Rebuild the outline, keeping the cursor on the selected block when it
    /// is still listed.
    fn refresh_rows(&mut self) {
        self.rows = self.editor.outline();
        if self.rows.is_empty() {
            self.list_state.select(None);
            self.editor.clear_selection();
            return;
        }
        let listed = self
            .editor
            .selection()
            .get()
            .and_then(|id| self.rows.iter().position(|row| &row.id == id));
        match listed {
            Some(index) => self.list_state.select(Some(index)),
            None => {
                let index = self
                    .list_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.rows.len() - 1);
                self.select_index(index);
            }
        }
    }

    fn select_index(&mut self, index: usize) {
        if let Some(row) = self.rows.get(index) {
            let id = row.id.clone();
            self.editor.select(&id);
            self.list_state.select(Some(index));
        }
    }

    fn selected_id(&self) -> Option<BlockId> {
        self.editor.selection().get().cloned()
    }

    fn next_block(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.rows.len(),
            None => 0,
        };
        self.select_index(i);
    }

    fn previous_block(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.select_index(i);
    }

    fn apply(&mut self, cmd: Cmd) {
        let name = cmd.name();
        let patch = self.editor.apply(cmd);
        self.report(name, &patch);
        self.refresh_rows();
    }

    fn report(&mut self, name: &str, patch: &Patch) {
        self.status = if patch.outcome.is_applied() {
            match patch.removed.len() {
                0 => format!("{name}: done"),
                n => format!("{name}: done, {n} blocks removed"),
            }
        } else {
            format!("{name}: nothing changed ({:?})", patch.outcome)
        };
    }

    fn move_selected(&mut self, direction: MoveDirection) {
        if let Some(id) = self.selected_id() {
            self.apply(Cmd::Move { id, direction });
        }
    }

    fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.apply(Cmd::Delete { id });
        }
    }

    fn add_text(&mut self, target: InsertTarget) {
        match self.editor.add_block(self.registry, "text", target) {
            Some((id, patch)) => {
                self.report("insert", &patch);
                if patch.outcome.is_applied() {
                    self.editor.select(&id);
                }
                self.refresh_rows();
            }
            None => self.status = "no text block type registered".to_string(),
        }
    }

    fn add_child(&mut self) {
        if let Some(id) = self.selected_id() {
            self.add_text(InsertTarget::Parent(id));
        }
    }

    /// Step a columns block on to the next layout. When that would drop
    /// columns holding blocks, the first press only asks for confirmation.
    fn cycle_layout(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let Some(node) = self.editor.tree().node(&id) else {
            return;
        };
        if node.block_type != COLUMNS_TYPE {
            self.status = format!("{id} is not a columns block");
            return;
        }
        let current = node
            .str_prop("layout")
            .and_then(|layout| layout.parse::<ColumnLayout>().ok());
        let next = match current.and_then(|layout| {
            ColumnLayout::ALL
                .iter()
                .position(|candidate| *candidate == layout)
        }) {
            Some(i) => ColumnLayout::ALL[(i + 1) % ColumnLayout::ALL.len()],
            None => ColumnLayout::ALL[0],
        };

        let confirmed = self.pending_layout.take() == Some((id.clone(), next));
        let dropped = self.editor.tree().columns_to_drop(&id, next);
        if dropped > 0 && !confirmed {
            self.status = format!(
                "{next} drops {dropped} filled column{}: l again to confirm",
                if dropped == 1 { "" } else { "s" }
            );
            self.pending_layout = Some((id, next));
            return;
        }
        self.apply(Cmd::ResizeColumns { id, layout: next });
    }

    /// Act on one key press. Returns `true` when the editor should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if code != KeyCode::Char('q') {
            self.confirm_quit = false;
        }
        if code != KeyCode::Char('l') {
            self.pending_layout = None;
        }
        match code {
            KeyCode::Char('q') => {
                if !self.is_dirty() || self.confirm_quit {
                    return true;
                }
                self.confirm_quit = true;
                self.status = "Unsaved changes: s to save, q again to discard".to_string();
            }
            KeyCode::Down | KeyCode::Char('j') => self.next_block(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_block(),
            KeyCode::Char('J') => self.move_selected(MoveDirection::Down),
            KeyCode::Char('K') => self.move_selected(MoveDirection::Up),
            KeyCode::Char('x') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('a') => self.add_text(InsertTarget::Root),
            KeyCode::Char('c') => self.add_child(),
            KeyCode::Char('l') => self.cycle_layout(),
            KeyCode::Char('s') => self.save(),
            _ => {}
        }
        false
    }

    fn save(&mut self) {
        match self.source.save(&self.editor) {
            Ok(()) => {
                self.saved_version = self.editor.version();
                self.status = format!("saved {}", self.editor.slug());
            }
            Err(e) => self.status = format!("save failed: {e}"),
        }
    }

    fn preview_lines(&self) -> Vec<String> {
        let Some(id) = self.editor.selection().get() else {
            return vec!["Select a block to preview it".to_string()];
        };
        let Some(output) = self.editor.render_block(self.registry, id) else {
            return vec![format!("{id} is no longer on the page")];
        };
        let mut lines: Vec<String> = output.html.lines().map(str::to_string).collect();
        if !output.diagnostics.is_empty() {
            lines.push(String::new());
            lines.extend(output.diagnostics.iter().map(|d| format!("! {d}")));
        }
        lines
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {program} <page>                     edit a page");
    eprintln!("       {program} render <page>              print a page as HTML");
    eprintln!("       {program} import <fragment> <page>   append an .html or .md fragment to a page");
    eprintln!();
    eprintln!("<page> is a path to a .json page file or the slug of a page in the configured pages directory.");
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    log::debug!("Config path: {}", config_path.display());

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    let max_display_depth = config
        .as_ref()
        .and_then(|config| config.max_display_depth)
        .unwrap_or(DEFAULT_MAX_DISPLAY_DEPTH);

    match args.iter().skip(1).map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["render", page] => {
            let source = PageSource::resolve(page, config.as_ref())?;
            render_page(&source, max_display_depth)
        }
        ["import", fragment, page] => {
            let source = PageSource::resolve(page, config.as_ref())?;
            import_fragment(&source, Path::new(fragment), max_display_depth)
        }
        [page] if !matches!(*page, "render" | "import") => {
            let source = PageSource::resolve(page, config.as_ref())?;
            run_editor(source, max_display_depth)
        }
        [] => {
            if let Some(config) = &config {
                let store = FilePageStore::open(&config.pages_path)?;
                let slugs = store.list()?;
                eprintln!("Pages in {}:", config.pages_path.display());
                for slug in slugs {
                    eprintln!("  {slug}");
                }
                eprintln!();
            } else {
                eprintln!("No config file found at {}", config_path.display());
            }
            usage(&args[0]);
            process::exit(1);
        }
        _ => {
            usage(&args[0]);
            process::exit(1);
        }
    }
}

fn render_page(source: &PageSource, max_display_depth: usize) -> Result<()> {
    let editor = source.open(max_display_depth)?;
    let output = editor.render(registry::global());
    for diagnostic in &output.diagnostics {
        log::warn!("{diagnostic}");
    }
    println!("{}", output.html);
    Ok(())
}

fn import_fragment(source: &PageSource, fragment: &Path, max_display_depth: usize) -> Result<()> {
    let registry = registry::global();
    let content = std::fs::read_to_string(fragment)
        .with_context(|| format!("reading {}", fragment.display()))?;

    let mut editor = source.open(max_display_depth)?;
    let before = editor.tree().root_ids().len();
    let is_markdown = fragment
        .extension()
        .is_some_and(|ext| ext == "md" || ext == "markdown");
    let patch = if is_markdown {
        editor.import_markdown(registry, &content)?
    } else {
        editor.import_markup(registry, &content)?
    };
    if !patch.outcome.is_applied() {
        bail!("import left the page unchanged: {:?}", patch.outcome);
    }

    source.save(&editor)?;
    log::info!(
        "Imported {} blocks into '{}'",
        editor.tree().root_ids().len() - before,
        editor.slug()
    );
    Ok(())
}

fn run_editor(source: PageSource, max_display_depth: usize) -> Result<()> {
    // Load before touching the terminal so errors print normally
    let mut app = App::new(source, max_display_depth)?;
    log::info!("Editing '{}'", app.editor.slug());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && app.handle_key(key.code)
        {
            return Ok(());
        }
    }
}

fn row_line(row: &OutlineRow) -> Line<'static> {
    let indent = "  ".repeat(row.depth);
    let mut spans = vec![Span::raw(indent)];
    if let Some(slot) = row.slot {
        spans.push(Span::styled(
            format!("[{slot}] "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        row.block_type.clone(),
        Style::default().fg(Color::Cyan),
    ));
    if !row.summary.is_empty() {
        spans.push(Span::raw(format!(" {}", row.summary)));
    }
    if row.hidden > 0 {
        spans.push(Span::styled(
            format!(" (+{} nested)", row.hidden),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(rows[0]);

    // Outline panel
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| ListItem::new(vec![row_line(row)]))
        .collect();

    let title = format!(
        "{}{} (v{})",
        app.editor.title(),
        if app.is_dirty() { " *" } else { "" },
        app.editor.version()
    );
    let outline = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(outline, chunks[0], &mut app.list_state);

    // Preview panel
    let preview_text: Vec<Line> = app
        .preview_lines()
        .into_iter()
        .map(|line| Line::from(vec![Span::raw(line)]))
        .collect();

    let preview = Paragraph::new(preview_text)
        .block(Block::default().borders(Borders::ALL).title("HTML"))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(preview, chunks[1]);

    // Status and instructions
    let help_text = vec![
        Line::from(Span::raw(app.status.clone())),
        Line::from(vec![
            Span::raw("q: Quit | j/k: Select | J/K: Move | "),
            Span::raw("a: Add | c: Add child | x: Delete | l: Layout | s: Save"),
        ]),
    ];

    let help = Paragraph::new(help_text).block(Block::default());

    f.render_widget(help, rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpage_engine::models::{Block, Page};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn app_with_columns(layout: &str, columns: serde_json::Value) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = FilePageStore::open(dir.path()).unwrap();
        let mut page = Page::new("Sports Day");
        page.blocks = vec![
            serde_json::from_value::<Block>(json!({
                "id": "cols",
                "type": "columns",
                "properties": { "layout": layout, "columns": columns }
            }))
            .unwrap(),
        ];
        store.put(&page).unwrap();

        let source = PageSource {
            store,
            slug: page.slug.clone(),
        };
        let app = App::new(source, DEFAULT_MAX_DISPLAY_DEPTH).unwrap();
        (dir, app)
    }

    fn results_column() -> serde_json::Value {
        json!([
            { "blocks": [] },
            { "blocks": [] },
            { "blocks": [] },
            { "blocks": [{ "id": "results", "type": "text", "properties": { "content": "Results" } }] }
        ])
    }

    fn layout(app: &App) -> String {
        let block = app.editor.tree().locate(&"cols".into()).unwrap();
        block.str_prop("layout").unwrap_or_default().to_string()
    }

    #[test]
    fn layout_dropping_filled_column_needs_second_press() {
        let (_dir, mut app) = app_with_columns("equal-4", results_column());
        assert_eq!(app.selected_id(), Some(BlockId::from("cols")));

        assert!(!app.handle_key(KeyCode::Char('l')));
        assert_eq!(app.editor.version(), 0);
        assert_eq!(layout(&app), "equal-4");
        assert!(app.editor.tree().contains(&"results".into()));
        assert_eq!(app.status, "1-1 drops 1 filled column: l again to confirm");

        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.editor.version(), 1);
        assert_eq!(layout(&app), "1-1");
        assert!(!app.editor.tree().contains(&"results".into()));
    }

    #[test]
    fn other_key_cancels_pending_layout() {
        let (_dir, mut app) = app_with_columns("equal-4", results_column());

        app.handle_key(KeyCode::Char('l'));
        app.handle_key(KeyCode::Char('?'));
        app.handle_key(KeyCode::Char('l'));

        assert_eq!(app.editor.version(), 0);
        assert!(app.editor.tree().contains(&"results".into()));
    }

    #[test]
    fn layout_keeping_every_filled_column_applies_at_once() {
        let (_dir, mut app) = app_with_columns(
            "1-1",
            json!([
                { "blocks": [{ "id": "map", "type": "text", "properties": { "content": "Map" } }] },
                { "blocks": [] }
            ]),
        );

        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.editor.version(), 1);
        assert_eq!(layout(&app), "2-1");
        assert!(app.editor.tree().contains(&"map".into()));

        assert!(!app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('q')));
    }
}
