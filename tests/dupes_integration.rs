mod common;

use common::{BASIC, CLOZE, Fixture, basic_model};
use flashfind_core::FinderResult;
use flashfind_core::collection::models::{ModelSet, NoteType, NoteTypeKind, Template};
use flashfind_core::dupes::DupeGroup;

async fn cities() -> FinderResult<Fixture> {
    let fx = Fixture::empty().await?;
    fx.note_with_card(1, BASIC, &["<b>Paris</b>", "France"], &["europe"]).await?;
    fx.note_with_card(2, BASIC, &["London", "England"], &["europe"]).await?;
    fx.note_with_card(3, BASIC, &["Paris", "Texas"], &["usa"]).await?;
    fx.note_with_card(4, BASIC, &["", "nowhere"], &[]).await?;
    fx.note_with_card(5, BASIC, &["<br>", "also nowhere"], &[]).await?;
    fx.note_with_card(6, BASIC, &["London", "Ontario"], &["canada"]).await?;
    fx.note_with_card(7, BASIC, &["Paris", "Ontario"], &["canada"]).await?;
    fx.note_with_card(8, CLOZE, &["Paris", ""], &[]).await?;
    Ok(fx)
}

#[tokio::test]
async fn groups_values_after_stripping_markup() -> FinderResult<()> {
    let fx = cities().await?;
    let groups = fx.finder().find_dupes("Front", None).await?;

    assert_eq!(
        groups,
        vec![
            DupeGroup {
                value: "Paris".to_string(),
                nids: vec![1, 3, 7],
            },
            DupeGroup {
                value: "London".to_string(),
                nids: vec![2, 6],
            },
        ]
    );

    Ok(())
}

#[tokio::test]
async fn field_name_is_case_insensitive() -> FinderResult<()> {
    let fx = cities().await?;
    let groups = fx.finder().find_dupes("front", None).await?;

    assert_eq!(groups.len(), 2);

    Ok(())
}

#[tokio::test]
async fn search_narrows_the_notes_considered() -> FinderResult<()> {
    let fx = cities().await?;
    let finder = fx.finder();

    let groups = finder.find_dupes("Front", Some("tag:europe or tag:usa")).await?;
    assert_eq!(
        groups,
        vec![DupeGroup {
            value: "Paris".to_string(),
            nids: vec![1, 3],
        }]
    );

    let groups = finder.find_dupes("Back", Some("tag:canada")).await?;
    assert_eq!(
        groups,
        vec![DupeGroup {
            value: "Ontario".to_string(),
            nids: vec![6, 7],
        }]
    );

    assert!(finder.find_dupes("Front", Some("tag:europe")).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn empty_values_are_never_duplicates() -> FinderResult<()> {
    let fx = Fixture::empty().await?;
    fx.note_with_card(1, BASIC, &["", "a"], &[]).await?;
    fx.note_with_card(2, BASIC, &["", "b"], &[]).await?;
    fx.note_with_card(3, BASIC, &[" ", "c"], &[]).await?;

    assert!(fx.finder().find_dupes("Front", None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn unknown_field_has_no_duplicates() -> FinderResult<()> {
    let fx = cities().await?;
    assert!(fx.finder().find_dupes("Nope", None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn field_names_that_look_like_search_syntax() -> FinderResult<()> {
    const ODD: i64 = 3;
    let odd = NoteType {
        id: ODD,
        name: "Odd".to_string(),
        kind: NoteTypeKind::Standard,
        fields: ["Tag", "Deck", "Bob's: note", "*"].map(String::from).to_vec(),
        templates: vec![Template {
            name: "Card 1".to_string(),
            ord: 0,
        }],
        sort_idx: 0,
    };
    let fx = Fixture::with_models(ModelSet::new(vec![basic_model(), odd])).await?;
    fx.note_with_card(1, ODD, &["red", "x", "same", "a"], &[]).await?;
    fx.note_with_card(2, ODD, &["red", "y", "same", "b"], &[]).await?;
    fx.note_with_card(3, ODD, &["blue", "y", "other", "b"], &[]).await?;
    fx.note_with_card(4, BASIC, &["red", "red"], &[]).await?;
    let finder = fx.finder();

    assert_eq!(
        finder.find_dupes("Tag", None).await?,
        vec![DupeGroup {
            value: "red".to_string(),
            nids: vec![1, 2],
        }]
    );
    assert_eq!(
        finder.find_dupes("deck", None).await?,
        vec![DupeGroup {
            value: "y".to_string(),
            nids: vec![2, 3],
        }]
    );
    assert_eq!(
        finder.find_dupes("Bob's: note", None).await?,
        vec![DupeGroup {
            value: "same".to_string(),
            nids: vec![1, 2],
        }]
    );
    // the name is not a pattern
    assert_eq!(finder.find_dupes("*", None).await?.len(), 1);
    assert!(finder.find_dupes("Bob's", None).await?.is_empty());

    Ok(())
}
