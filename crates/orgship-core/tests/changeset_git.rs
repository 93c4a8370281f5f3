//! Change-set resolution against real git repositories.

mod support;

use orgship_core::Error;
use orgship_core::changeset::{resolve_commits, resolve_full};
use orgship_core::metadata::Classifier;
use orgship_core::vcs::{GitRepository, VersionControl};

use support::git::ScratchRepo;

fn keys<V>(map: &std::collections::BTreeMap<String, V>) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

#[test]
fn addition_and_deletion_between_commits() {
    let scratch = ScratchRepo::new();
    scratch
        .write("src/classes/A.cls", "public class A {}")
        .write("src/classes/A.cls-meta.xml", "<ApexClass/>");
    let first = scratch.commit("add A");

    scratch
        .remove("src/classes/A.cls")
        .remove("src/classes/A.cls-meta.xml")
        .write("src/classes/B.cls", "public class B {}")
        .write("src/classes/B.cls-meta.xml", "<ApexClass/>");
    let second = scratch.commit("replace A with B");

    let repo = GitRepository::open(scratch.path()).unwrap();
    let changes = resolve_commits(&repo, &first, &second, &Classifier::new("src/")).unwrap();

    assert_eq!(keys(changes.additions()), vec!["src/classes/B.cls"]);
    assert_eq!(keys(changes.deletions()), vec!["src/classes/A.cls"]);
    assert!(changes.modified_new().is_empty());
    assert_eq!(
        changes.additions()["src/classes/B.cls"].body,
        b"public class B {}".to_vec()
    );
    assert_eq!(
        changes.deletions()["src/classes/A.cls"].body,
        b"public class A {}".to_vec()
    );
}

#[test]
fn sidecar_only_change_modifies_the_owner() {
    let scratch = ScratchRepo::new();
    scratch
        .write("src/classes/A.cls", "public class A {}")
        .write("src/classes/A.cls-meta.xml", "<apiVersion>57.0</apiVersion>");
    let first = scratch.commit("add A");
    scratch.write("src/classes/A.cls-meta.xml", "<apiVersion>58.0</apiVersion>");
    let second = scratch.commit("bump api");

    let repo = GitRepository::open(scratch.path()).unwrap();
    let changes = resolve_commits(&repo, &first, &second, &Classifier::new("src/")).unwrap();

    assert_eq!(keys(changes.modified_new()), vec!["src/classes/A.cls"]);
    assert_eq!(keys(changes.modified_old()), vec!["src/classes/A.cls"]);
    assert_eq!(
        changes.modified_new()["src/classes/A.cls"].body,
        b"public class A {}".to_vec()
    );
}

#[test]
fn paths_outside_the_source_root_are_dropped() {
    let scratch = ScratchRepo::new();
    scratch.write("README.md", "readme");
    let first = scratch.commit("init");
    scratch
        .write("README.md", "changed")
        .write("scripts/classes/X.cls", "class X {}")
        .write("src/unknown/Thing.txt", "?")
        .write("src/objects/Account.object", "<CustomObject/>");
    let second = scratch.commit("mixed");

    let repo = GitRepository::open(scratch.path()).unwrap();
    let changes = resolve_commits(&repo, &first, &second, &Classifier::new("src/")).unwrap();

    assert_eq!(keys(changes.additions()), vec!["src/objects/Account.object"]);
    assert!(changes.deletions().is_empty());
    assert!(changes.modified_new().is_empty());
}

#[test]
fn full_tree_for_deploy_all() {
    let scratch = ScratchRepo::new();
    scratch
        .write("src/classes/A.cls", "a")
        .write("src/classes/A.cls-meta.xml", "<m/>")
        .write("src/email/Sales/Welcome.email", "hi")
        .write("src/email/Sales/Welcome.email-meta.xml", "<m/>")
        .write("docs/guide.md", "guide");
    let head = scratch.commit("init");

    let repo = GitRepository::open(scratch.path()).unwrap();
    let changes = resolve_full(&repo, &head, &Classifier::new("src/")).unwrap();

    assert_eq!(
        keys(changes.additions()),
        vec!["src/classes/A.cls", "src/email/Sales/Welcome.email"]
    );
    assert_eq!(
        changes.additions()["src/email/Sales/Welcome.email"].member,
        "Sales/Welcome"
    );
}

#[test]
fn revisions_and_blobs() {
    let scratch = ScratchRepo::new();
    scratch.write("src/classes/A.cls", "a");
    let first = scratch.commit("one");
    scratch.write("src/classes/B.cls", "b");
    let second = scratch.commit("two");

    let repo = GitRepository::open(scratch.path()).unwrap();
    assert_eq!(repo.resolve("HEAD").unwrap(), second);
    assert_eq!(repo.resolve("HEAD~1").unwrap(), first);
    let err = repo.resolve("no-such-branch").unwrap_err();
    assert!(matches!(err, Error::RevisionNotFound { .. }));
    assert!(err.is_vcs());

    assert_eq!(repo.blob("src/classes/A.cls", &first).unwrap(), b"a".to_vec());
    assert!(matches!(
        repo.blob("src/classes/B.cls", &first),
        Err(Error::ObjectNotFound { .. })
    ));
    assert_eq!(
        repo.list(&second).unwrap(),
        vec!["src/classes/A.cls".to_string(), "src/classes/B.cls".to_string()]
    );
}
