use consult_core::{RoomId, SignalEnvelope, SignalPayload, UserId};
use consult_server::RoomCommand;

use crate::integration::{create_test_manager, init_tracing, join, users};

#[test]
fn test_disconnect_updates_roster() {
    init_tracing();

    let (manager, signaling) = create_test_manager(2);
    let room = RoomId::from("appt-42");

    let a = join(&manager, &room, "A");
    let b = join(&manager, &room, "B");

    manager.handle(&room, RoomCommand::Disconnect { connection: a });

    assert_eq!(signaling.last_roster_for(&b), Some(users(&["B"])));
    assert_eq!(manager.roster(&room), users(&["B"]));
}

#[test]
fn test_leave_message_updates_roster() {
    init_tracing();

    let (manager, signaling) = create_test_manager(2);
    let room = RoomId::from("appt-42");

    let a = join(&manager, &room, "A");
    let b = join(&manager, &room, "B");

    manager.handle(
        &room,
        RoomCommand::from_envelope(
            b,
            SignalEnvelope::broadcast(UserId::from("B"), SignalPayload::Leave),
        ),
    );

    assert_eq!(signaling.last_roster_for(&a), Some(users(&["A"])));
}

#[test]
fn test_last_leave_destroys_room() {
    init_tracing();

    let (manager, _signaling) = create_test_manager(2);
    let room = RoomId::from("appt-42");

    let a = join(&manager, &room, "A");
    assert_eq!(manager.room_count(), 1);

    manager.handle(&room, RoomCommand::Disconnect { connection: a });

    assert_eq!(manager.room_count(), 0);
    assert!(manager.roster(&room).is_empty());
}

#[test]
fn test_rejoin_after_reconnect_keeps_single_entry() {
    init_tracing();

    let (manager, signaling) = create_test_manager(2);
    let room = RoomId::from("appt-42");

    let old = join(&manager, &room, "A");
    let new = join(&manager, &room, "A");

    // The stale socket closing must not evict the fresh one.
    manager.handle(&room, RoomCommand::Disconnect { connection: old });

    assert_eq!(manager.roster(&room), users(&["A"]));
    assert_eq!(signaling.last_roster_for(&new), Some(users(&["A"])));
}
