use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use workmind_core::{GrantType, Invitation, InvitationStatus, Role, Workspace, WorkspaceMember};

use super::PermissionStore;
use crate::error::AuthError;
use crate::types::AuditEntry;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &str) -> Result<Self, AuthError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> Result<Self, AuthError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AuthError> {
        self.conn
            .lock()
            .map_err(|_| AuthError::Internal("store lock poisoned".into()))
    }
}

const MIGRATE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS wm_workspaces (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    owner_id TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS wm_members (
    id TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL REFERENCES wm_workspaces(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    full_name TEXT,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (workspace_id, user_id)
);

CREATE TABLE IF NOT EXISTS wm_permission_overrides (
    member_id TEXT NOT NULL REFERENCES wm_members(id) ON DELETE CASCADE,
    permission TEXT NOT NULL,
    grant_type TEXT NOT NULL CHECK (grant_type IN ('grant', 'revoke')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (member_id, permission)
);

CREATE TABLE IF NOT EXISTS wm_audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id TEXT NOT NULL,
    user_id TEXT,
    action TEXT NOT NULL,
    target TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS wm_invitations (
    id TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL REFERENCES wm_workspaces(id) ON DELETE CASCADE,
    email TEXT NOT NULL,
    role TEXT NOT NULL,
    invited_by TEXT NOT NULL,
    token TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_wm_invitations_pending
    ON wm_invitations(workspace_id, email) WHERE status = 'pending';
CREATE INDEX IF NOT EXISTS idx_wm_members_user ON wm_members(user_id);
CREATE INDEX IF NOT EXISTS idx_wm_audit_workspace ON wm_audit_log(workspace_id);
"#;

const MEMBER_COLUMNS: &str =
    "id, workspace_id, user_id, email, full_name, role, created_at, updated_at";

const INVITATION_COLUMNS: &str =
    "id, workspace_id, email, role, invited_by, token, expires_at, status, created_at, updated_at";

/// SQLite datetime modifier for how long an invitation stays valid.
const INVITATION_TTL: &str = "+7 days";

fn workspace_from_row(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<WorkspaceMember> {
    let role: String = row.get(5)?;
    let workspace_role = role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(WorkspaceMember {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        user_id: row.get(2)?,
        email: row.get(3)?,
        full_name: row.get(4)?,
        workspace_role,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn invitation_from_row(row: &Row<'_>) -> rusqlite::Result<Invitation> {
    let role: String = row.get(3)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let status: String = row.get(7)?;
    let status = status
        .parse::<InvitationStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
    Ok(Invitation {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        email: row.get(2)?,
        role,
        invited_by: row.get(4)?,
        token: row.get(5)?,
        expires_at: row.get(6)?,
        status,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.extended_code == 2067 || err.extended_code == 1555
    )
}

fn member_insert_error(e: rusqlite::Error, user_id: &str) -> AuthError {
    if unique_violation(&e) {
        return AuthError::Duplicate(format!(
            "user '{user_id}' is already a member of this workspace"
        ));
    }
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        // SQLITE_CONSTRAINT_FOREIGNKEY
        if err.extended_code == 787 {
            return AuthError::NotFound("workspace not found".into());
        }
    }
    AuthError::Database(e.to_string())
}

fn not_found(what: &'static str) -> impl Fn(rusqlite::Error) -> AuthError {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => AuthError::NotFound(format!("{what} not found")),
        _ => AuthError::Database(e.to_string()),
    }
}

#[async_trait]
impl PermissionStore for SqliteStore {
    async fn migrate(&self) -> Result<(), AuthError> {
        let conn = self.conn()?;
        conn.execute_batch(MIGRATE_SQL)?;
        Ok(())
    }

    // --- Workspaces ---

    async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
        owner_user_id: &str,
        owner_email: &str,
    ) -> Result<Workspace, AuthError> {
        let id = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let id = uuid::Uuid::now_v7().to_string();
            tx.execute(
                "INSERT INTO wm_workspaces (id, name, description, owner_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, description, owner_user_id],
            )?;
            tx.execute(
                "INSERT INTO wm_members (id, workspace_id, user_id, email, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    uuid::Uuid::now_v7().to_string(),
                    id,
                    owner_user_id,
                    owner_email,
                    Role::Owner.as_str()
                ],
            )?;
            tx.commit()?;
            id
        };
        tracing::debug!("created workspace {id} owned by {owner_user_id}");
        self.get_workspace(&id).await
    }

    async fn get_workspace(&self, id: &str) -> Result<Workspace, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, description, owner_id, created_at, updated_at FROM wm_workspaces WHERE id = ?1",
            [id],
            workspace_from_row,
        )
        .map_err(not_found("workspace"))
    }

    async fn list_user_workspaces(&self, user_id: &str) -> Result<Vec<Workspace>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT w.id, w.name, w.description, w.owner_id, w.created_at, w.updated_at
             FROM wm_workspaces w
             JOIN wm_members m ON m.workspace_id = w.id
             WHERE m.user_id = ?1
             ORDER BY w.created_at, w.id",
        )?;
        let workspaces = stmt
            .query_map([user_id], workspace_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workspaces)
    }

    async fn update_workspace(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Workspace, AuthError> {
        {
            let conn = self.conn()?;
            let changed = conn.execute(
                "UPDATE wm_workspaces
                 SET name = COALESCE(?1, name), description = COALESCE(?2, description),
                     updated_at = datetime('now')
                 WHERE id = ?3",
                rusqlite::params![name, description, id],
            )?;
            if changed == 0 {
                return Err(AuthError::NotFound("workspace not found".into()));
            }
        }
        self.get_workspace(id).await
    }

    async fn delete_workspace(&self, id: &str) -> Result<(), AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM wm_workspaces WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(AuthError::NotFound("workspace not found".into()));
        }
        tracing::debug!("deleted workspace {id}");
        Ok(())
    }

    // --- Members ---

    async fn add_member(
        &self,
        workspace_id: &str,
        user_id: &str,
        email: &str,
        full_name: Option<&str>,
        role: Role,
    ) -> Result<WorkspaceMember, AuthError> {
        let id = {
            let conn = self.conn()?;
            let id = uuid::Uuid::now_v7().to_string();
            conn.execute(
                "INSERT INTO wm_members (id, workspace_id, user_id, email, full_name, role) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, workspace_id, user_id, email, full_name, role.as_str()],
            )
            .map_err(|e| member_insert_error(e, user_id))?;
            id
        };
        self.get_member(workspace_id, &id).await
    }

    async fn get_member(
        &self,
        workspace_id: &str,
        member_id: &str,
    ) -> Result<WorkspaceMember, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM wm_members WHERE workspace_id = ?1 AND id = ?2"),
            [workspace_id, member_id],
            member_from_row,
        )
        .map_err(not_found("member"))
    }

    async fn find_member_by_user(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMember, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {MEMBER_COLUMNS} FROM wm_members WHERE workspace_id = ?1 AND user_id = ?2"
            ),
            [workspace_id, user_id],
            member_from_row,
        )
        .map_err(not_found("member"))
    }

    async fn list_members(&self, workspace_id: &str) -> Result<Vec<WorkspaceMember>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM wm_members WHERE workspace_id = ?1 ORDER BY created_at, id"
        ))?;
        let members = stmt
            .query_map([workspace_id], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    async fn update_member_role(
        &self,
        workspace_id: &str,
        member_id: &str,
        role: Role,
    ) -> Result<WorkspaceMember, AuthError> {
        {
            let conn = self.conn()?;
            let changed = conn.execute(
                "UPDATE wm_members SET role = ?1, updated_at = datetime('now') WHERE workspace_id = ?2 AND id = ?3",
                rusqlite::params![role.as_str(), workspace_id, member_id],
            )?;
            if changed == 0 {
                return Err(AuthError::NotFound("member not found".into()));
            }
        }
        self.get_member(workspace_id, member_id).await
    }

    async fn remove_member(&self, workspace_id: &str, member_id: &str) -> Result<(), AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM wm_members WHERE workspace_id = ?1 AND id = ?2",
            [workspace_id, member_id],
        )?;
        if changed == 0 {
            return Err(AuthError::NotFound("member not found".into()));
        }
        Ok(())
    }

    // --- Invitations ---

    async fn create_invitation(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
        invited_by: &str,
    ) -> Result<Invitation, AuthError> {
        let id = {
            let conn = self.conn()?;
            let id = uuid::Uuid::now_v7().to_string();
            let email = email.trim().to_lowercase();
            conn.execute(
                "INSERT INTO wm_invitations (id, workspace_id, email, role, invited_by, token, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now', ?7))",
                rusqlite::params![
                    id,
                    workspace_id,
                    email,
                    role.as_str(),
                    invited_by,
                    new_token(),
                    INVITATION_TTL
                ],
            )
            .map_err(|e| {
                if unique_violation(&e) {
                    return AuthError::Duplicate(format!("'{email}' already has a pending invitation"));
                }
                AuthError::Database(e.to_string())
            })?;
            id
        };
        self.get_invitation(workspace_id, &id).await
    }

    async fn list_pending_invitations(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Invitation>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INVITATION_COLUMNS} FROM wm_invitations
             WHERE workspace_id = ?1 AND status = 'pending' ORDER BY created_at, id"
        ))?;
        let invitations = stmt
            .query_map([workspace_id], invitation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invitations)
    }

    async fn get_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<Invitation, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {INVITATION_COLUMNS} FROM wm_invitations WHERE workspace_id = ?1 AND id = ?2"
            ),
            [workspace_id, invitation_id],
            invitation_from_row,
        )
        .map_err(not_found("invitation"))
    }

    async fn find_invitation_by_token(&self, token: &str) -> Result<Invitation, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {INVITATION_COLUMNS} FROM wm_invitations WHERE token = ?1"),
            [token],
            invitation_from_row,
        )
        .map_err(not_found("invitation"))
    }

    async fn renew_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<Invitation, AuthError> {
        {
            let conn = self.conn()?;
            let changed = conn.execute(
                "UPDATE wm_invitations
                 SET token = ?1, expires_at = datetime('now', ?2), updated_at = datetime('now')
                 WHERE workspace_id = ?3 AND id = ?4 AND status = 'pending'",
                rusqlite::params![new_token(), INVITATION_TTL, workspace_id, invitation_id],
            )?;
            if changed == 0 {
                return Err(AuthError::NotFound("pending invitation not found".into()));
            }
        }
        self.get_invitation(workspace_id, invitation_id).await
    }

    async fn delete_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<(), AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM wm_invitations WHERE workspace_id = ?1 AND id = ?2 AND status = 'pending'",
            [workspace_id, invitation_id],
        )?;
        if changed == 0 {
            return Err(AuthError::NotFound("pending invitation not found".into()));
        }
        Ok(())
    }

    async fn accept_invitation(
        &self,
        invitation_id: &str,
        user_id: &str,
        email: &str,
    ) -> Result<WorkspaceMember, AuthError> {
        let (workspace_id, member_id) = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let (workspace_id, role, status, live): (String, String, String, bool) = tx
                .query_row(
                    "SELECT workspace_id, role, status, expires_at > datetime('now')
                     FROM wm_invitations WHERE id = ?1",
                    [invitation_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .map_err(not_found("invitation"))?;
            if status != InvitationStatus::Pending.as_str() {
                return Err(AuthError::InvalidInput("invitation was already accepted".into()));
            }
            if !live {
                return Err(AuthError::InvalidInput("invitation has expired".into()));
            }

            let member_id = uuid::Uuid::now_v7().to_string();
            tx.execute(
                "INSERT INTO wm_members (id, workspace_id, user_id, email, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![member_id, workspace_id, user_id, email, role],
            )
            .map_err(|e| member_insert_error(e, user_id))?;
            tx.execute(
                "UPDATE wm_invitations SET status = 'accepted', updated_at = datetime('now') WHERE id = ?1",
                [invitation_id],
            )?;
            tx.commit()?;
            (workspace_id, member_id)
        };
        tracing::debug!("{user_id} joined workspace {workspace_id}");
        self.get_member(&workspace_id, &member_id).await
    }

    // --- Overrides ---

    async fn set_override(
        &self,
        member_id: &str,
        permission: &str,
        grant: GrantType,
    ) -> Result<(), AuthError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO wm_permission_overrides (member_id, permission, grant_type) VALUES (?1, ?2, ?3)
             ON CONFLICT (member_id, permission)
             DO UPDATE SET grant_type = excluded.grant_type, updated_at = datetime('now')",
            rusqlite::params![member_id, permission, grant.as_str()],
        )?;
        Ok(())
    }

    async fn clear_override(&self, member_id: &str, permission: &str) -> Result<bool, AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM wm_permission_overrides WHERE member_id = ?1 AND permission = ?2",
            [member_id, permission],
        )?;
        Ok(changed > 0)
    }

    async fn list_overrides(
        &self,
        member_id: &str,
    ) -> Result<HashMap<String, GrantType>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT permission, grant_type FROM wm_permission_overrides WHERE member_id = ?1",
        )?;
        let rows = stmt
            .query_map([member_id], |row| {
                let permission: String = row.get(0)?;
                let grant: String = row.get(1)?;
                let grant = grant.parse::<GrantType>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                })?;
                Ok((permission, grant))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(rows)
    }

    // --- Audit ---

    async fn log_audit(
        &self,
        workspace_id: &str,
        user_id: Option<&str>,
        action: &str,
        target: Option<&str>,
    ) -> Result<(), AuthError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO wm_audit_log (workspace_id, user_id, action, target) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![workspace_id, user_id, action, target],
        )?;
        Ok(())
    }

    async fn list_audit(
        &self,
        workspace_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEntry>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, user_id, action, target, created_at
             FROM wm_audit_log WHERE workspace_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
        )?;
        let entries = stmt
            .query_map(rusqlite::params![workspace_id, limit, offset], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    workspace_id: row.get(1)?,
                    user_id: row.get(2)?,
                    action: row.get(3)?,
                    target: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
