//! [`SqliteStore`]: the SQLite implementation of [`ContactStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};

use roster_core::{
  account::Account,
  contact::{
    Contact, ContactId, ContactStamp, ContactUpdate, GlobalContact, GlobalContactId,
    NewContact, NewGlobalContact, OwnerId,
  },
  network::NetworkKind,
  normalise::normalise_url,
  store::ContactStore,
};

use crate::{
  Result,
  encode::{
    CONTACT_COLUMNS, GCONTACT_COLUMNS, RawAccount, RawContact, RawGlobalContact,
    decode_dt, encode_date, encode_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn opt_dt(dt: Option<DateTime<Utc>>) -> Value {
  dt.map_or(Value::Null, |dt| Value::Text(encode_dt(dt)))
}

/// `?n, ?n+1, ...` for an `IN (...)` list starting at parameter `first`.
fn placeholders(first: usize, count: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Query helpers ─────────────────────────────────────────────────────────

  async fn select_contacts(&self, filter: String, params: Vec<Value>) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact WHERE {filter}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn select_stamp(&self, filter: String, params: Vec<Value>) -> Result<Option<ContactStamp>> {
    let raw: Option<(i64, String)> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT id, avatar_date FROM contact WHERE {filter} LIMIT 1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), |row| {
              Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(id, avatar_date)| {
        Ok(ContactStamp { id: ContactId(id), avatar_date: decode_dt(&avatar_date)? })
      })
      .transpose()
  }

  async fn select_globals(&self, filter: &'static str, param: String) -> Result<Vec<GlobalContact>> {
    let raws: Vec<RawGlobalContact> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {GCONTACT_COLUMNS} FROM gcontact WHERE {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawGlobalContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGlobalContact::into_global).collect()
  }

  async fn execute(&self, sql: String, params: Vec<Value>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(changed)
  }

  // ── Directory, accounts, settings, groups ─────────────────────────────────

  /// Write a directory entry and return its id.
  pub async fn insert_global_contact(&self, input: &NewGlobalContact) -> Result<GlobalContactId> {
    let params = vec![
      text(&input.url),
      text(&normalise_url(&input.url)),
      text(&input.addr),
      text(&input.alias),
      text(&input.name),
      text(&input.nick),
      text(&input.photo),
      text(input.network.code()),
      text(&input.keywords),
      text(&input.location),
      text(&input.about),
      text(&input.gender),
      Value::Integer(input.community.into()),
      input.contact_type.map_or(Value::Null, Value::Integer),
      input.birthday.map_or(Value::Null, |d| Value::Text(encode_date(d))),
      opt_dt(input.updated),
      opt_dt(input.last_contact),
      opt_dt(input.last_failure),
    ];

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO gcontact (
             url, nurl, addr, alias, name, nick, photo, network, keywords,
             location, about, gender, community, contact_type, birthday,
             updated, last_contact, last_failure
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18)",
          rusqlite::params_from_iter(params),
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(GlobalContactId(id))
  }

  /// Register a local account.
  pub async fn create_account(&self, nickname: &str, url: &str) -> Result<Account> {
    let nickname = nickname.to_owned();
    let url = url.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user (nickname, url) VALUES (?1, ?2)",
          rusqlite::params![nickname, url],
        )?;
        Ok(RawAccount {
          uid: conn.last_insert_rowid(),
          nickname,
          url,
          removed: false,
          expires_on: None,
        })
      })
      .await?;

    raw.into_account()
  }

  /// Whether `nickname` belonged to a removed account.
  pub async fn is_nickname_reserved(&self, nickname: &str) -> Result<bool> {
    let nickname = nickname.to_owned();
    let reserved = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM userd WHERE username = ?1",
              rusqlite::params![nickname],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(reserved)
  }

  pub async fn set_owner_setting(
    &self,
    owner: OwnerId,
    category: &str,
    key: &str,
    value: &str,
  ) -> Result<()> {
    self
      .execute(
        "INSERT INTO pconfig (uid, cat, k, v) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (uid, cat, k) DO UPDATE SET v = excluded.v"
          .to_owned(),
        vec![Value::Integer(owner.0), text(category), text(key), text(value)],
      )
      .await?;
    Ok(())
  }

  pub async fn add_group_member(&self, owner: OwnerId, group: i64, contact: ContactId) -> Result<()> {
    self
      .execute(
        "INSERT INTO group_member (uid, gid, contact_id) VALUES (?1, ?2, ?3)".to_owned(),
        vec![Value::Integer(owner.0), Value::Integer(group), Value::Integer(contact.0)],
      )
      .await?;
    Ok(())
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = crate::Error;

  // ── Resolver lookups ──────────────────────────────────────────────────────

  async fn find_by_nurl(&self, nurl: &str, owner: OwnerId) -> Result<Option<ContactStamp>> {
    self
      .select_stamp(
        "nurl = ?1 AND uid = ?2 ORDER BY id".to_owned(),
        vec![text(nurl), Value::Integer(owner.0)],
      )
      .await
  }

  async fn find_by_addr(&self, addr: &str, owner: OwnerId) -> Result<Option<ContactStamp>> {
    self
      .select_stamp(
        "addr = ?1 AND uid = ?2 ORDER BY id".to_owned(),
        vec![text(addr), Value::Integer(owner.0)],
      )
      .await
  }

  async fn find_by_alias(&self, aliases: &[String], owner: OwnerId) -> Result<Option<ContactStamp>> {
    if aliases.is_empty() {
      return Ok(None);
    }
    let filter = format!(
      "alias IN ({}) AND uid = ?1 ORDER BY id",
      placeholders(2, aliases.len())
    );
    let mut params = vec![Value::Integer(owner.0)];
    params.extend(aliases.iter().map(|a| text(a)));
    self.select_stamp(filter, params).await
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    Ok(
      self
        .select_contacts("id = ?1".to_owned(), vec![Value::Integer(id.0)])
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn self_contact(&self, owner: OwnerId) -> Result<Option<Contact>> {
    Ok(
      self
        .select_contacts(
          "uid = ?1 AND self = 1 ORDER BY id LIMIT 1".to_owned(),
          vec![Value::Integer(owner.0)],
        )
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn contacts_by_nurl(&self, nurl: &str, owner: OwnerId) -> Result<Vec<Contact>> {
    self
      .select_contacts(
        "nurl = ?1 AND uid = ?2 ORDER BY id".to_owned(),
        vec![text(nurl), Value::Integer(owner.0)],
      )
      .await
  }

  async fn contacts_by_alias(&self, aliases: &[String], owner: OwnerId) -> Result<Vec<Contact>> {
    if aliases.is_empty() {
      return Ok(Vec::new());
    }
    let filter = format!(
      "alias IN ({}) AND uid = ?1 ORDER BY id",
      placeholders(2, aliases.len())
    );
    let mut params = vec![Value::Integer(owner.0)];
    params.extend(aliases.iter().map(|a| text(a)));
    self.select_contacts(filter, params).await
  }

  async fn contacts_by_addr(&self, addr: &str, owner: OwnerId) -> Result<Vec<Contact>> {
    self
      .select_contacts(
        "addr = ?1 AND uid = ?2 ORDER BY id".to_owned(),
        vec![text(addr), Value::Integer(owner.0)],
      )
      .await
  }

  async fn find_by_nurl_and_network(
    &self,
    nurl: &str,
    network: NetworkKind,
    owner: OwnerId,
  ) -> Result<Option<Contact>> {
    Ok(
      self
        .select_contacts(
          "nurl = ?1 AND network = ?2 AND uid = ?3 ORDER BY id LIMIT 1".to_owned(),
          vec![text(nurl), text(network.code()), Value::Integer(owner.0)],
        )
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn insert_contact(&self, input: &NewContact) -> Result<ContactId> {
    let now = Value::Text(encode_dt(input.now));
    let params = vec![
      Value::Integer(input.owner.0),
      now.clone(),
      Value::Integer(input.is_self.into()),
      text(&input.url),
      text(&normalise_url(&input.url)),
      text(&input.addr),
      text(&input.alias),
      text(&input.name),
      text(&input.nick),
      text(&input.photo),
      text(&input.keywords),
      text(&input.location),
      text(&input.about),
      text(input.network.code()),
      text(&input.pubkey),
      text(&input.notify),
      text(&input.poll),
      text(&input.request),
      text(&input.confirm),
      text(&input.poco),
      Value::Integer(input.priority),
      text(&input.batch),
      Value::Integer(input.rel.code()),
      now,
    ];

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contact (
             uid, created, self, url, nurl, addr, alias, name, nick, photo,
             keywords, location, about, network, pubkey, notify, poll,
             request, confirm, poco, priority, batch, rel,
             name_date, uri_date, avatar_date,
             writable, blocked, readonly, pending
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23,
                     ?24, ?24, ?24, 1, 0, 0, 0)",
          rusqlite::params_from_iter(params),
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ContactId(id))
  }

  async fn contact_ids_by_nurl(
    &self,
    nurl: &str,
    owner: OwnerId,
    limit: usize,
  ) -> Result<Vec<ContactId>> {
    let nurl = nurl.to_owned();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id FROM contact WHERE nurl = ?1 AND uid = ?2 ORDER BY id LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![nurl, owner.0, limit], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(ContactId).collect())
  }

  async fn delete_public_duplicates(&self, nurl: &str, keep: ContactId) -> Result<usize> {
    self
      .execute(
        "DELETE FROM contact WHERE nurl = ?1 AND uid = 0 AND id != ?2 AND self = 0".to_owned(),
        vec![text(nurl), Value::Integer(keep.0)],
      )
      .await
  }

  async fn update_contact(&self, id: ContactId, update: &ContactUpdate) -> Result<()> {
    let texts = [
      ("addr", &update.addr),
      ("alias", &update.alias),
      ("name", &update.name),
      ("nick", &update.nick),
      ("photo", &update.photo),
      ("keywords", &update.keywords),
      ("location", &update.location),
      ("about", &update.about),
      ("gender", &update.gender),
    ];
    let dates = [
      ("name_date", update.name_date),
      ("uri_date", update.uri_date),
      ("avatar_date", update.avatar_date),
    ];

    let mut sets: Vec<(&'static str, Value)> = texts
      .into_iter()
      .filter_map(|(col, v)| v.as_deref().map(|v| (col, text(v))))
      .collect();
    sets.extend(
      dates
        .into_iter()
        .filter_map(|(col, v)| v.map(|v| (col, Value::Text(encode_dt(v))))),
    );
    if sets.is_empty() {
      return Ok(());
    }

    let assignments = sets
      .iter()
      .enumerate()
      .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!("UPDATE contact SET {assignments} WHERE id = ?{}", sets.len() + 1);

    let mut params: Vec<Value> = sets.into_iter().map(|(_, v)| v).collect();
    params.push(Value::Integer(id.0));
    self.execute(sql, params).await?;
    Ok(())
  }

  async fn delete_contact(&self, id: ContactId) -> Result<bool> {
    let deleted = self
      .execute("DELETE FROM contact WHERE id = ?1".to_owned(), vec![Value::Integer(id.0)])
      .await?;
    Ok(deleted > 0)
  }

  async fn archive_removed_contact(&self, id: ContactId) -> Result<()> {
    self
      .execute(
        "UPDATE contact SET archive = 1, network = ?1, writable = 0 WHERE id = ?2".to_owned(),
        vec![text(NetworkKind::None.code()), Value::Integer(id.0)],
      )
      .await?;
    Ok(())
  }

  // ── Liveness ──────────────────────────────────────────────────────────────

  async fn set_term_date(&self, id: ContactId, at: Option<DateTime<Utc>>) -> Result<()> {
    self
      .execute(
        "UPDATE contact SET term_date = ?1 WHERE id = ?2".to_owned(),
        vec![opt_dt(at), Value::Integer(id.0)],
      )
      .await?;
    Ok(())
  }

  async fn start_term_dates_by_nurl(&self, nurl: &str, at: DateTime<Utc>) -> Result<usize> {
    self
      .execute(
        "UPDATE contact SET term_date = ?1 WHERE nurl = ?2 AND term_date IS NULL".to_owned(),
        vec![Value::Text(encode_dt(at)), text(nurl)],
      )
      .await
  }

  async fn clear_term_dates_by_nurl(&self, nurl: &str) -> Result<usize> {
    self
      .execute(
        "UPDATE contact SET term_date = NULL WHERE nurl = ?1".to_owned(),
        vec![text(nurl)],
      )
      .await
  }

  async fn archive_contact(&self, id: ContactId) -> Result<()> {
    self
      .execute("UPDATE contact SET archive = 1 WHERE id = ?1".to_owned(), vec![Value::Integer(id.0)])
      .await?;
    Ok(())
  }

  async fn archive_by_nurl(&self, nurl: &str) -> Result<usize> {
    self
      .execute("UPDATE contact SET archive = 1 WHERE nurl = ?1".to_owned(), vec![text(nurl)])
      .await
  }

  // ── Global directory ──────────────────────────────────────────────────────

  async fn global_contacts_by_nurl(&self, nurl: &str) -> Result<Vec<GlobalContact>> {
    self.select_globals("nurl = ?1", nurl.to_owned()).await
  }

  async fn global_contacts_by_addr(&self, addr: &str) -> Result<Vec<GlobalContact>> {
    self.select_globals("addr = ?1", addr.to_owned()).await
  }

  async fn random_global_profile(
    &self,
    network: NetworkKind,
    updated_after: DateTime<Utc>,
  ) -> Result<Option<String>> {
    let network = network.code();
    let cutoff = encode_dt(updated_after);

    let url = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT url FROM gcontact
               WHERE network = ?1
                 AND COALESCE(last_contact, '') >= COALESCE(last_failure, '')
                 AND updated > ?2
               ORDER BY random() LIMIT 1",
              rusqlite::params![network, cutoff],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(url)
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn get_account(&self, uid: OwnerId) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, nickname, url, account_removed, account_expires_on
               FROM user WHERE uid = ?1",
              rusqlite::params![uid.0],
              |row| {
                Ok(RawAccount {
                  uid:        row.get(0)?,
                  nickname:   row.get(1)?,
                  url:        row.get(2)?,
                  removed:    row.get(3)?,
                  expires_on: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn reserve_nickname(&self, nickname: &str) -> Result<()> {
    self
      .execute("INSERT INTO userd (username) VALUES (?1)".to_owned(), vec![text(nickname)])
      .await?;
    Ok(())
  }

  async fn mark_account_removed(&self, uid: OwnerId, expires_on: DateTime<Utc>) -> Result<()> {
    let changed = self
      .execute(
        "UPDATE user SET account_removed = 1, account_expires_on = ?1 WHERE uid = ?2".to_owned(),
        vec![Value::Text(encode_dt(expires_on)), Value::Integer(uid.0)],
      )
      .await?;
    if changed == 0 {
      return Err(crate::Error::AccountNotFound(uid.0));
    }
    Ok(())
  }

  async fn owner_setting(&self, owner: OwnerId, category: &str, key: &str) -> Result<Option<String>> {
    let category = category.to_owned();
    let key = key.to_owned();

    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT v FROM pconfig WHERE uid = ?1 AND cat = ?2 AND k = ?3",
              rusqlite::params![owner.0, category, key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(value)
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn count_ungrouped(&self, owner: OwnerId) -> Result<u64> {
    let total: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM contact
           WHERE uid = ?1 AND self = 0
             AND id NOT IN (SELECT DISTINCT contact_id FROM group_member WHERE uid = ?1)",
          rusqlite::params![owner.0],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(u64::try_from(total).unwrap_or_default())
  }

  async fn list_ungrouped(&self, owner: OwnerId, start: usize, count: usize) -> Result<Vec<Contact>> {
    self
      .select_contacts(
        "uid = ?1 AND self = 0 AND blocked = 0 AND pending = 0
           AND id NOT IN (SELECT DISTINCT contact_id FROM group_member WHERE uid = ?1)
         ORDER BY id LIMIT ?2 OFFSET ?3"
          .to_owned(),
        vec![
          Value::Integer(owner.0),
          Value::Integer(i64::try_from(count).unwrap_or(i64::MAX)),
          Value::Integer(i64::try_from(start).unwrap_or(i64::MAX)),
        ],
      )
      .await
  }
}
