mod test_disconnect_updates_roster;
