//! Warp leaderboard figures read straight from its MySQL database.

use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DbBackend, DbErr, FromQueryResult, QueryResult,
    Statement,
};
use tracing::{debug, error, instrument};
use url::Url;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};

use super::count;

const USERS_QUERY: &str = "SELECT COUNT(*) AS total FROM users";

const QUESTS_QUERY: &str = "SELECT t2.description, t2.type, COUNT(*) AS count \
    FROM quests_history t1 \
    JOIN quests t2 ON t1.quest_pid = t2.pid \
    GROUP BY t1.quest_pid, t2.description \
    ORDER BY count DESC";

/// Label used when a quest has no type.
const NULL_TYPE: &str = "NULL";

#[derive(Debug, FromQueryResult)]
struct UserCount {
    total: i64,
}

/// A quest and how many times it was completed.
#[derive(Debug, Clone, PartialEq)]
struct QuestDone {
    description: String,
    kind: Option<String>,
    count: i64,
}

impl FromQueryResult for QuestDone {
    fn from_query_result(res: &QueryResult, pre: &str) -> std::result::Result<Self, DbErr> {
        Ok(Self {
            description: res
                .try_get::<Option<String>>(pre, "description")?
                .unwrap_or_default(),
            kind: res.try_get(pre, "type")?,
            count: res.try_get(pre, "count")?,
        })
    }
}

impl QuestDone {
    fn kind_label(&self) -> &str {
        self.kind.as_deref().unwrap_or(NULL_TYPE)
    }
}

/// Exports the Warp user count and completions per quest.
#[derive(Debug)]
pub struct WarpCollector {
    url: Url,
    chain_id: String,
    connect_timeout: Duration,
    users: StatusGauge<1>,
    quests_done: StatusGauge<3>,
}

impl WarpCollector {
    /// Register the Warp gauges. A connection to `url` is opened on every
    /// scrape and closed afterwards.
    pub fn new(
        metrics: &CoreMetrics,
        url: Url,
        chain_id: String,
        connect_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            url,
            chain_id,
            connect_timeout,
            users: metrics.new_status_gauge(
                "warp_users",
                "Returns the total number of users in the Warp leaderboard",
                ["chain_id"],
            )?,
            quests_done: metrics.new_status_gauge(
                "warp_quests_done",
                "Returns the total number of done per quests",
                ["chain_id", "description", "type"],
            )?,
        })
    }

    #[instrument(skip_all, fields(host = self.url.host_str()))]
    async fn connect(&self) -> Result<DatabaseConnection> {
        let mut options = ConnectOptions::new(self.url.to_string());
        options
            .connect_timeout(self.connect_timeout)
            .max_connections(1)
            .sqlx_logging(false);
        Database::connect(options)
            .await
            .wrap_err("When connecting to the warp database")
    }

    async fn query(
        &self,
        db: &DatabaseConnection,
        scrape: &Scrape,
    ) -> (Result<f64>, Result<Vec<QuestDone>>) {
        let users = async {
            let row = UserCount::find_by_statement(Statement::from_string(
                DbBackend::MySql,
                USERS_QUERY,
            ))
            .one(db)
            .await
            .wrap_err("When counting users")?;
            Ok::<_, eyre::Report>(row.map_or(0.0, |row| count(row.total.max(0) as u64)))
        };
        let quests = async {
            QuestDone::find_by_statement(Statement::from_string(DbBackend::MySql, QUESTS_QUERY))
                .all(db)
                .await
                .wrap_err("When counting quest completions")
        };
        tokio::join!(scrape.call(users), scrape.call(quests))
    }

    fn record_failure(&self, what: &str, err: &eyre::Report) {
        error!(collector = self.name(), ?err, "failed to read {what}");
    }
}

#[async_trait]
impl MetricsCollector for WarpCollector {
    fn name(&self) -> &'static str {
        "warp"
    }

    async fn collect(&self, scrape: &Scrape) {
        let db = match scrape.call(self.connect()).await {
            Ok(db) => db,
            Err(err) => {
                self.record_failure("the warp database", &err);
                self.users.error([self.chain_id.as_str()]);
                self.quests_done.error([self.chain_id.as_str(), "", ""]);
                return;
            }
        };

        let (users, quests) = self.query(&db, scrape).await;
        if let Err(err) = db.close().await {
            debug!(collector = self.name(), ?err, "closing the warp database failed");
        }

        match users {
            Ok(total) => self.users.success([self.chain_id.as_str()], total),
            Err(err) => {
                self.record_failure("users", &err);
                self.users.error([self.chain_id.as_str()]);
            }
        }

        match quests {
            Ok(quests) => {
                for quest in &quests {
                    self.quests_done.success(
                        [
                            self.chain_id.as_str(),
                            quest.description.as_str(),
                            quest.kind_label(),
                        ],
                        count(quest.count.max(0) as u64),
                    );
                }
            }
            Err(err) => {
                self.record_failure("quests", &err);
                self.quests_done.error([self.chain_id.as_str(), "", ""]);
            }
        }
    }
}
