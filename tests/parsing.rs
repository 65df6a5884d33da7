mod common;

use faceoff_terminal::error::PipelineError;
use faceoff_terminal::players::clean_players;
use faceoff_terminal::sheet::{RawPlayer, SheetTable, parse_raw_faceoffs, parse_raw_players};
use faceoff_terminal::team_codes::TeamCodes;

use common::player;

const EVENT_HEADERS: [&str; 19] = [
    "League",
    "HomeTeam",
    "AwayTeam",
    "FOWinTeam",
    "FOWinner",
    "FOLoser",
    "Season",
    "GameNumber",
    "Period",
    "TimeRemaining",
    "TimeElapsed",
    "HomeStrengthID",
    "HomeStrength",
    "HomeZone",
    "AwayZone",
    "HomeScore",
    "AwayScore",
    "x",
    "y",
];

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[test]
fn event_sheet_rows_become_raw_faceoffs() {
    let table = SheetTable::new(
        "NHLFaceOffs",
        &EVENT_HEADERS,
        vec![row(&[
            "NHL",
            "Nashville Predators",
            "Dallas Stars",
            "Dallas Stars",
            "8475158",
            "8476887",
            "20222023",
            "12",
            "2",
            "14:30",
            "05:30",
            "55",
            "EV",
            "Def",
            "Off",
            "1",
            "2.0",
            "-69",
            "22",
        ])],
    );
    let raw = parse_raw_faceoffs(&table).unwrap();
    assert_eq!(raw.len(), 1);
    let r = &raw[0];
    assert_eq!(r.home_team, "Nashville Predators");
    assert_eq!(r.winner_id, 8_475_158);
    assert_eq!(r.loser_id, 8_476_887);
    assert_eq!(r.game_number, 12);
    assert_eq!(r.away_score, 2);
    assert_eq!((r.x, r.y), (-69.0, 22.0));
    assert_eq!(r.time_elapsed, "05:30");
}

#[test]
fn missing_event_column_is_reported() {
    let headers: Vec<&str> = EVENT_HEADERS
        .iter()
        .copied()
        .filter(|h| *h != "HomeZone")
        .collect();
    let table = SheetTable::new("NHLFaceOffs", &headers, Vec::new());
    assert_eq!(
        parse_raw_faceoffs(&table).unwrap_err(),
        PipelineError::MissingColumn {
            table: "NHLFaceOffs".to_string(),
            column: "HomeZone",
        }
    );
}

#[test]
fn non_numeric_coordinates_are_malformed() {
    let mut cells = vec![
        "NHL",
        "Nashville Predators",
        "Dallas Stars",
        "Dallas Stars",
        "1",
        "2",
        "20222023",
        "1",
        "1",
        "20:00",
        "0:00",
        "55",
        "EV",
        "Neu",
        "Neu",
        "0",
        "0",
        "0",
        "0",
    ];
    cells[17] = "left";
    let table = SheetTable::new("NHLFaceOffs", &EVENT_HEADERS, vec![row(&cells)]);
    assert!(matches!(
        parse_raw_faceoffs(&table),
        Err(PipelineError::MalformedField { field: "x", .. })
    ));
}

#[test]
fn player_sheet_keeps_first_duplicate_and_blank_cells() {
    let table = SheetTable::new(
        "PlayerInfo",
        &["PlayerID", "Height", "Weight", "Shoots", "Nationality"],
        vec![
            row(&["1001", "6'1", "190", "L", "CAN"]),
            row(&["1002", "", "", "", ""]),
            row(&["1001", "5'9", "170", "R", "USA"]),
        ],
    );
    let players = parse_raw_players(&table).unwrap();
    assert_eq!(
        players,
        vec![
            RawPlayer {
                player_id: 1001,
                height: Some("6'1".to_string()),
                weight: Some(190.0),
                shoots: Some("L".to_string()),
                nationality: Some("CAN".to_string()),
            },
            RawPlayer {
                player_id: 1002,
                height: None,
                weight: None,
                shoots: None,
                nationality: None,
            },
        ]
    );
}

#[test]
fn nationality_column_is_optional() {
    let table = SheetTable::new(
        "PlayerInfo",
        &["PlayerID", "Height", "Weight", "Shoots"],
        vec![row(&["7", "6'0", "200", "R"])],
    );
    let players = parse_raw_players(&table).unwrap();
    assert_eq!(players[0].nationality, None);
}

#[test]
fn cleaning_imputes_median_and_mode() {
    let mut blank = player(4, "", 0.0, "");
    blank.height = None;
    blank.weight = None;
    blank.shoots = None;
    let raw = vec![
        player(1, "6'0", 180.0, "L"),
        player(2, "6'2", 200.0, "R"),
        player(3, "bad", 190.0, "L"),
        blank,
    ];
    let cleaned = clean_players(&raw).unwrap();
    assert_eq!(cleaned.len(), 4);
    // Heights observed: 72, 74 -> median 73.
    assert_eq!(cleaned[2].height, 73.0);
    assert_eq!(cleaned[3].height, 73.0);
    assert_eq!(cleaned[3].weight, 190.0);
    assert_eq!(cleaned[3].shoots, "L");
    assert_eq!(cleaned[0].height, 72.0);
}

#[test]
fn cleaning_fails_without_any_observed_weight() {
    let mut a = player(1, "6'0", 0.0, "L");
    a.weight = None;
    assert_eq!(
        clean_players(&[a]).unwrap_err(),
        PipelineError::NoObservedValues { field: "weight" }
    );
    assert_eq!(clean_players(&[]).unwrap(), Vec::new());
}

#[test]
fn team_codes_csv_resolves_both_ways() {
    let csv = "TeamName,TeamCode\nNashville Predators,NSH\n Dallas Stars , DAL \n";
    let codes = TeamCodes::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(codes.len(), 2);
    assert_eq!(codes.resolve("Dallas Stars"), Ok("DAL"));
    assert_eq!(codes.name_for_code("NSH"), Some("Nashville Predators"));
    assert_eq!(codes.lookup("NSH"), Some("NSH"));
    assert_eq!(codes.lookup("Nashville Predators"), Some("NSH"));
    assert_eq!(codes.distinct_codes(), vec!["NSH".to_string(), "DAL".to_string()]);
    assert!(matches!(
        codes.resolve("Quebec Nordiques"),
        Err(PipelineError::UnresolvableTeam { .. })
    ));
}
