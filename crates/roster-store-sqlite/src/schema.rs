//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per (remote identity, owner). uid 0 is the shared cache.
-- Resolution does not run in a transaction; duplicate shared rows left by
-- racing inserts are cleaned up after the fact.
CREATE TABLE IF NOT EXISTS contact (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    uid           INTEGER NOT NULL DEFAULT 0,
    created       TEXT    NOT NULL,
    self          INTEGER NOT NULL DEFAULT 0,
    url           TEXT    NOT NULL DEFAULT '',
    nurl          TEXT    NOT NULL DEFAULT '',
    addr          TEXT    NOT NULL DEFAULT '',
    alias         TEXT    NOT NULL DEFAULT '',
    name          TEXT    NOT NULL DEFAULT '',
    nick          TEXT    NOT NULL DEFAULT '',
    photo         TEXT    NOT NULL DEFAULT '',
    thumb         TEXT    NOT NULL DEFAULT '',
    micro         TEXT    NOT NULL DEFAULT '',
    keywords      TEXT    NOT NULL DEFAULT '',
    location      TEXT    NOT NULL DEFAULT '',
    about         TEXT    NOT NULL DEFAULT '',
    gender        TEXT    NOT NULL DEFAULT '',
    xmpp          TEXT    NOT NULL DEFAULT '',
    network       TEXT    NOT NULL DEFAULT '',  -- NetworkKind code
    pubkey        TEXT    NOT NULL DEFAULT '',
    notify        TEXT    NOT NULL DEFAULT '',
    poll          TEXT    NOT NULL DEFAULT '',
    request       TEXT    NOT NULL DEFAULT '',
    confirm       TEXT    NOT NULL DEFAULT '',
    poco          TEXT    NOT NULL DEFAULT '',
    priority      INTEGER NOT NULL DEFAULT 0,
    batch         TEXT    NOT NULL DEFAULT '',
    rel           INTEGER NOT NULL DEFAULT 0,
    name_date     TEXT    NOT NULL,
    uri_date      TEXT    NOT NULL,
    avatar_date   TEXT    NOT NULL,
    term_date     TEXT,                          -- NULL while reachable
    archive       INTEGER NOT NULL DEFAULT 0,
    writable      INTEGER NOT NULL DEFAULT 0,
    blocked       INTEGER NOT NULL DEFAULT 0,
    readonly      INTEGER NOT NULL DEFAULT 0,
    pending       INTEGER NOT NULL DEFAULT 0,
    forum         INTEGER NOT NULL DEFAULT 0,
    prv           INTEGER NOT NULL DEFAULT 0,
    contact_type  INTEGER,                       -- NULL: classify by forum/prv
    bd            TEXT                           -- YYYY-MM-DD
);

CREATE INDEX IF NOT EXISTS contact_nurl_idx  ON contact(nurl, uid);
CREATE INDEX IF NOT EXISTS contact_addr_idx  ON contact(addr, uid);
CREATE INDEX IF NOT EXISTS contact_alias_idx ON contact(alias, uid);

-- Owner-less directory harvested from posts and peers.
CREATE TABLE IF NOT EXISTS gcontact (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    url           TEXT    NOT NULL DEFAULT '',
    nurl          TEXT    NOT NULL DEFAULT '',
    addr          TEXT    NOT NULL DEFAULT '',
    alias         TEXT    NOT NULL DEFAULT '',
    name          TEXT    NOT NULL DEFAULT '',
    nick          TEXT    NOT NULL DEFAULT '',
    photo         TEXT    NOT NULL DEFAULT '',
    network       TEXT    NOT NULL DEFAULT '',
    keywords      TEXT    NOT NULL DEFAULT '',
    location      TEXT    NOT NULL DEFAULT '',
    about         TEXT    NOT NULL DEFAULT '',
    gender        TEXT    NOT NULL DEFAULT '',
    community     INTEGER NOT NULL DEFAULT 0,
    contact_type  INTEGER,
    birthday      TEXT,
    updated       TEXT,
    last_contact  TEXT,
    last_failure  TEXT
);

CREATE INDEX IF NOT EXISTS gcontact_nurl_idx ON gcontact(nurl);
CREATE INDEX IF NOT EXISTS gcontact_addr_idx ON gcontact(addr);

CREATE TABLE IF NOT EXISTS user (
    uid                 INTEGER PRIMARY KEY AUTOINCREMENT,
    nickname            TEXT    NOT NULL UNIQUE,
    url                 TEXT    NOT NULL DEFAULT '',
    account_removed     INTEGER NOT NULL DEFAULT 0,
    account_expires_on  TEXT
);

-- Nicknames of removed accounts; never handed out again.
CREATE TABLE IF NOT EXISTS userd (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    username  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS pconfig (
    uid  INTEGER NOT NULL,
    cat  TEXT    NOT NULL,
    k    TEXT    NOT NULL,
    v    TEXT    NOT NULL,
    PRIMARY KEY (uid, cat, k)
);

CREATE TABLE IF NOT EXISTS group_member (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    uid         INTEGER NOT NULL,
    gid         INTEGER NOT NULL,
    contact_id  INTEGER NOT NULL
);

-- Intake for the external job runner.
CREATE TABLE IF NOT EXISTS workerqueue (
    job_id    TEXT    PRIMARY KEY,
    command   TEXT    NOT NULL,
    payload   TEXT    NOT NULL,   -- JSON-encoded Job
    priority  INTEGER NOT NULL,
    created   TEXT    NOT NULL,
    done      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS workerqueue_pending_idx ON workerqueue(done, priority);

PRAGMA user_version = 1;
";
