use crate::signaling::ConnectionId;
use consult_core::{RoomId, UserId};

#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: UserId,
    pub connection: ConnectionId,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    Joined,
    /// Same user joined again from another socket; the old one is detached.
    Replaced { previous: ConnectionId },
    AlreadyJoined,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    Full { capacity: usize },
    IdentityMismatch { bound: UserId },
}

impl Rejection {
    pub fn reason(&self) -> String {
        match self {
            Rejection::Full { capacity } => format!("room is full ({} participants)", capacity),
            Rejection::IdentityMismatch { bound } => {
                format!("connection already joined as {}", bound)
            }
        }
    }
}

/// Roster of one appointment room, in join order.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    capacity: usize,
    members: Vec<Member>,
}

impl Room {
    pub fn new(id: RoomId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn admit(
        &mut self,
        user_id: UserId,
        connection: ConnectionId,
    ) -> Result<Admission, Rejection> {
        if let Some(bound) = self.member_by_connection(&connection) {
            if bound.user_id == user_id {
                return Ok(Admission::AlreadyJoined);
            }
            return Err(Rejection::IdentityMismatch {
                bound: bound.user_id.clone(),
            });
        }

        if let Some(existing) = self.members.iter_mut().find(|m| m.user_id == user_id) {
            let previous = std::mem::replace(&mut existing.connection, connection);
            return Ok(Admission::Replaced { previous });
        }

        if self.members.len() >= self.capacity {
            return Err(Rejection::Full {
                capacity: self.capacity,
            });
        }

        self.members.push(Member {
            user_id,
            connection,
        });
        Ok(Admission::Joined)
    }

    pub fn remove_connection(&mut self, connection: &ConnectionId) -> Option<Member> {
        let idx = self
            .members
            .iter()
            .position(|m| &m.connection == connection)?;
        Some(self.members.remove(idx))
    }

    pub fn member_by_connection(&self, connection: &ConnectionId) -> Option<&Member> {
        self.members.iter().find(|m| &m.connection == connection)
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn roster(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
