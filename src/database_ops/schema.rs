/// Logical schema of the pipeline. Every statement is idempotent.
///
/// `decklist_entries` deliberately has no uniqueness constraint; corpus
/// ingestion replaces a tournament's rows instead. `deck_results` is derived
/// and rebuilt wholesale by the aggregator.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tournaments (
    tournament_id TEXT PRIMARY KEY,
    name TEXT,
    tournament_date TEXT,
    organizer TEXT,
    format TEXT,
    nb_players INTEGER
);

CREATE TABLE IF NOT EXISTS player_standings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tournament_id TEXT NOT NULL,
    player_id TEXT NOT NULL,
    round_number INTEGER NOT NULL,
    name TEXT,
    wins INTEGER,
    losses INTEGER,
    ties INTEGER,
    UNIQUE (tournament_id, player_id)
);

CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    name TEXT,
    element_type TEXT,
    hp INTEGER,
    stage TEXT,
    evolves_from TEXT,
    weakness TEXT,
    retreat TEXT,
    extension TEXT
);

CREATE TABLE IF NOT EXISTS decklist_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tournament_id TEXT NOT NULL,
    player_id TEXT NOT NULL,
    card_type TEXT NOT NULL,
    card_name TEXT NOT NULL,
    card_url TEXT NOT NULL,
    card_count INTEGER NOT NULL CHECK (card_count > 0)
);
CREATE INDEX IF NOT EXISTS idx_decklist_entries_tournament
    ON decklist_entries (tournament_id, player_id);

CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tournament_id TEXT NOT NULL,
    match_index INTEGER NOT NULL,
    player1 TEXT NOT NULL,
    score_p1 INTEGER NOT NULL,
    player2 TEXT NOT NULL,
    score_p2 INTEGER NOT NULL,
    winner TEXT,
    UNIQUE (tournament_id, match_index)
);

CREATE TABLE IF NOT EXISTS deck_results (
    deck TEXT NOT NULL,
    tournament_id TEXT NOT NULL,
    nb_match INTEGER NOT NULL,
    nb_victory INTEGER NOT NULL,
    winrate REAL,
    ext INTEGER,
    extension TEXT,
    nb_players INTEGER NOT NULL
);
"#;
