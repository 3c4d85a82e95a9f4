use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("library-cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let help = String::from_utf8(output).unwrap();
    for command in ["serve", "migrate", "seed", "ping"] {
        assert!(help.contains(command), "missing {command} in help");
    }
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("library-cli")
        .unwrap()
        .arg("reindex")
        .assert()
        .failure();
}
