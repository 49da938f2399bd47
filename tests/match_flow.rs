//! Integration tests for match scheduling, result announcement, history,
//! and the sorted status views.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sports_club_web::service::{
    ClubError, EventInput, EventService, MatchService, NewMatch, NewTeam, ResultInput, TeamService,
};
use sports_club_web::store::{collections, encode, DocumentStore, MemoryStore};
use sports_club_web::{
    ApprovalStatus, AssignmentError, Event, GameMatch, GameType, MatchResult, MatchState,
    MatchStatus, TeamSide, User, UserType, ValidationError,
};
use std::collections::HashSet;
use std::sync::Arc;

fn player(n: usize, game: GameType) -> User {
    User {
        unique_id: format!("player-{n}"),
        email: format!("player{n}@club.test"),
        first_name: "Player".to_string(),
        last_name: format!("{n}"),
        user_type: UserType::Player,
        status: ApprovalStatus::Approved,
        selected_games: vec![game],
        approved_games: Vec::new(),
        pending_approvals: Vec::new(),
        teams: Vec::new(),
        created_at: Utc::now(),
    }
}

async fn seed_event(
    store: &dyn DocumentStore,
    game_type: GameType,
    participants: usize,
) -> (String, Vec<String>) {
    let mut ids = Vec::new();
    for n in 0..participants {
        let user = player(n, game_type.clone());
        ids.push(user.unique_id.clone());
        store
            .put(collections::USERS, Some(&user.email), encode(&user).unwrap())
            .await
            .unwrap();
    }
    let event = Event {
        id: String::new(),
        title: "Spring Invitational".to_string(),
        description: None,
        location: "Main Hall".to_string(),
        game_type,
        event_date: Utc::now() + Duration::days(7),
        max_participants: 40,
        coach_id: "coach-1".to_string(),
        participants: ids.clone(),
        created_at: Utc::now(),
    };
    let event_id = store
        .put(collections::EVENTS, None, encode(&event).unwrap())
        .await
        .unwrap();
    (event_id, ids)
}

fn new_team(name: &str, event_id: &str, participant_ids: Vec<String>) -> NewTeam {
    NewTeam {
        name: name.to_string(),
        event_id: event_id.to_string(),
        participant_ids,
    }
}

fn new_match(team1_id: &str, team2_id: &str, at: DateTime<Utc>) -> NewMatch {
    NewMatch {
        team1_id: team1_id.to_string(),
        team2_id: team2_id.to_string(),
        match_date_time: at,
        location: "Court 3".to_string(),
        description: None,
    }
}

fn winner_input(winner: TeamSide) -> ResultInput {
    ResultInput {
        winner,
        score: Some("3-1".to_string()),
        notes: None,
        announced_by: "coach-1".to_string(),
    }
}

#[tokio::test]
async fn schedule_match_stamps_both_teams() {
    let store = Arc::new(MemoryStore::new());
    let (event_id, players) = seed_event(store.as_ref(), GameType::TableTennis, 4).await;
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let aces = team_service
        .create_team("coach-1", new_team("Aces", &event_id, players[..2].to_vec()))
        .await
        .unwrap();
    let spins = team_service
        .create_team("coach-1", new_team("Spins", &event_id, players[2..].to_vec()))
        .await
        .unwrap();

    let kickoff = Utc::now() + Duration::days(2);
    let game = match_service
        .schedule_match(new_match(&aces.id, &spins.id, kickoff))
        .await
        .unwrap();

    assert_eq!(game.event_name, "Spring Invitational");
    assert_eq!(game.team1_name, "Aces");
    assert_eq!(game.team2_name, "Spins");
    assert_eq!(game.participants, players); // team 1's roster first
    assert_eq!(game.status, MatchState::Scheduled);
    assert_eq!(game.created_by, "coach-1");
    assert!(game.result.is_none());

    for team_id in [&aces.id, &spins.id] {
        let team = team_service.team(team_id).await.unwrap();
        assert_eq!(team.match_date_time, Some(kickoff));
        assert_eq!(team.match_id.as_deref(), Some(game.id.as_str()));
    }
}

#[tokio::test]
async fn pairing_a_team_with_itself_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let (event_id, players) = seed_event(store.as_ref(), GameType::TableTennis, 2).await;
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let aces = team_service
        .create_team("coach-1", new_team("Aces", &event_id, players))
        .await
        .unwrap();
    let err = match_service
        .schedule_match(new_match(&aces.id, &aces.id, Utc::now() + Duration::days(1)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClubError::Validation(ValidationError::SameTeam)
    ));
}

#[tokio::test]
async fn pairing_across_events_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let (event_a, players_a) = seed_event(store.as_ref(), GameType::TableTennis, 2).await;
    let (event_b, players_b) = seed_event(store.as_ref(), GameType::TableTennis, 2).await;
    let reds = team_service
        .create_team("coach-1", new_team("Reds", &event_a, players_a))
        .await
        .unwrap();
    let blues = team_service
        .create_team("coach-1", new_team("Blues", &event_b, players_b))
        .await
        .unwrap();

    let err = match_service
        .schedule_match(new_match(&reds.id, &blues.id, Utc::now() + Duration::days(1)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClubError::Validation(ValidationError::CrossEvent)
    ));
}

#[tokio::test]
async fn partial_rosters_cannot_be_scheduled() {
    let store = Arc::new(MemoryStore::new());
    let (event_id, players) = seed_event(store.as_ref(), GameType::Basketball, 8).await;
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let drafts = team_service
        .create_team("coach-1", new_team("Drafts", &event_id, players[..3].to_vec()))
        .await
        .unwrap();
    let full = team_service
        .create_team("coach-1", new_team("Starters", &event_id, players[3..8].to_vec()))
        .await
        .unwrap();

    let err = match_service
        .schedule_match(new_match(&drafts.id, &full.id, Utc::now() + Duration::days(1)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClubError::Validation(ValidationError::IncompleteRoster {
            required: 5,
            actual: 3,
            ..
        })
    ));
}

#[tokio::test]
async fn announce_result_records_winner_once() {
    let store = Arc::new(MemoryStore::new());
    let (event_id, players) = seed_event(store.as_ref(), GameType::TableTennis, 4).await;
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let aces = team_service
        .create_team("coach-1", new_team("Aces", &event_id, players[..2].to_vec()))
        .await
        .unwrap();
    let spins = team_service
        .create_team("coach-1", new_team("Spins", &event_id, players[2..].to_vec()))
        .await
        .unwrap();
    // Played two hours ago, so the result may come in.
    let game = match_service
        .schedule_match(new_match(&aces.id, &spins.id, Utc::now() - Duration::hours(2)))
        .await
        .unwrap();

    let completed = match_service
        .announce_result(&game.id, winner_input(TeamSide::Team2))
        .await
        .unwrap();
    assert_eq!(completed.status, MatchState::Completed);
    let result = completed.result.expect("result stored");
    assert_eq!(result.winner, TeamSide::Team2);
    assert_eq!(result.winner_team_name, "Spins");
    assert_eq!(result.loser_team_name, "Aces");
    assert_eq!(result.score.as_deref(), Some("3-1"));

    // A second announcement is refused and the first result stands.
    let err = match_service
        .announce_result(&game.id, winner_input(TeamSide::Team1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClubError::Validation(ValidationError::AlreadyAnnounced)
    ));
    let after = match_service.match_by_id(&game.id).await.unwrap();
    assert_eq!(after.result.unwrap().winner, TeamSide::Team2);
}

#[tokio::test]
async fn results_cannot_be_announced_before_kickoff() {
    let store = Arc::new(MemoryStore::new());
    let (event_id, players) = seed_event(store.as_ref(), GameType::TableTennis, 4).await;
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let aces = team_service
        .create_team("coach-1", new_team("Aces", &event_id, players[..2].to_vec()))
        .await
        .unwrap();
    let spins = team_service
        .create_team("coach-1", new_team("Spins", &event_id, players[2..].to_vec()))
        .await
        .unwrap();
    let game = match_service
        .schedule_match(new_match(&aces.id, &spins.id, Utc::now() + Duration::days(1)))
        .await
        .unwrap();

    let err = match_service
        .announce_result(&game.id, winner_input(TeamSide::Team1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClubError::Validation(ValidationError::MatchNotYetPlayable { .. })
    ));
}

#[tokio::test]
async fn history_lists_newest_announcement_first() {
    let store = Arc::new(MemoryStore::new());
    let (event_id, players) = seed_event(store.as_ref(), GameType::TableTennis, 4).await;
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    let aces = team_service
        .create_team("coach-1", new_team("Aces", &event_id, players[..2].to_vec()))
        .await
        .unwrap();
    let spins = team_service
        .create_team("coach-1", new_team("Spins", &event_id, players[2..].to_vec()))
        .await
        .unwrap();

    let first = match_service
        .schedule_match(new_match(&aces.id, &spins.id, Utc::now() - Duration::days(2)))
        .await
        .unwrap();
    let second = match_service
        .schedule_match(new_match(&aces.id, &spins.id, Utc::now() - Duration::days(1)))
        .await
        .unwrap();
    // A still-scheduled match stays out of the history.
    match_service
        .schedule_match(new_match(&aces.id, &spins.id, Utc::now() + Duration::days(1)))
        .await
        .unwrap();

    match_service
        .announce_result(&first.id, winner_input(TeamSide::Team1))
        .await
        .unwrap();
    match_service
        .announce_result(&second.id, winner_input(TeamSide::Team2))
        .await
        .unwrap();

    let history = match_service.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.windows(2).all(|pair| {
        let newer = pair[0].result.as_ref().unwrap().announced_at;
        let older = pair[1].result.as_ref().unwrap().announced_at;
        newer >= older
    }));
    let ids: HashSet<String> = history.iter().map(|m| m.id.clone()).collect();
    assert!(ids.contains(&first.id) && ids.contains(&second.id));
}

fn seeded_match(
    event_id: &str,
    n: u32,
    at: DateTime<Utc>,
    announced_at: Option<DateTime<Utc>>,
) -> GameMatch {
    GameMatch {
        id: String::new(),
        event_id: event_id.to_string(),
        event_name: "Seeded".to_string(),
        game_type: GameType::TableTennis,
        team1_id: format!("t{n}a"),
        team2_id: format!("t{n}b"),
        team1_name: format!("Team {n}A"),
        team2_name: format!("Team {n}B"),
        team1_participants: vec!["p1".to_string()],
        team2_participants: vec!["p2".to_string()],
        participants: vec!["p1".to_string(), "p2".to_string()],
        match_date_time: at,
        location: "Hall".to_string(),
        description: None,
        status: if announced_at.is_some() {
            MatchState::Completed
        } else {
            MatchState::Scheduled
        },
        created_by: "coach-9".to_string(),
        created_at: at - Duration::days(10),
        result: announced_at.map(|announced_at| MatchResult {
            winner: TeamSide::Team1,
            winner_team_name: format!("Team {n}A"),
            loser_team_name: format!("Team {n}B"),
            score: None,
            notes: None,
            announced_by: "coach-9".to_string(),
            announced_at,
        }),
    }
}

#[tokio::test]
async fn coach_views_rank_action_needed_first() {
    let store = Arc::new(MemoryStore::new());
    let match_service = MatchService::new(store.clone());
    let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();

    let upcoming = seeded_match("ev-1", 1, now + Duration::days(3), None);
    let today = seeded_match("ev-1", 2, now + Duration::hours(5), None);
    let due = seeded_match("ev-1", 3, now - Duration::hours(4), None);
    let done = seeded_match("ev-2", 4, now - Duration::days(2), Some(now - Duration::days(1)));
    for game in [&upcoming, &today, &due, &done] {
        store
            .put(collections::MATCHES, None, encode(game).unwrap())
            .await
            .unwrap();
    }

    let views = match_service
        .matches_for_coach("coach-9", None, now)
        .await
        .unwrap();
    let statuses: Vec<MatchStatus> = views.iter().map(|v| v.status).collect();
    assert_eq!(
        statuses,
        vec![
            MatchStatus::PastAwaitingResult,
            MatchStatus::Today,
            MatchStatus::Upcoming,
            MatchStatus::Completed,
        ]
    );
    assert_eq!(views[0].status_label, "Awaiting Result");
    assert_eq!(views[0].game_match.team1_name, "Team 3A");

    // Narrowed to one event.
    let only_ev2 = match_service
        .matches_for_coach("coach-9", Some("ev-2"), now)
        .await
        .unwrap();
    assert_eq!(only_ev2.len(), 1);
    assert_eq!(only_ev2[0].status, MatchStatus::Completed);

    // The player view filters by roster membership.
    let for_p1 = match_service
        .matches_for_player("p1", None, now)
        .await
        .unwrap();
    assert_eq!(for_p1.len(), 4);
    let for_stranger = match_service
        .matches_for_player("nobody", None, now)
        .await
        .unwrap();
    assert!(for_stranger.is_empty());
}

#[tokio::test]
async fn summer_cup_full_pipeline() {
    let store = Arc::new(MemoryStore::new());
    let events = EventService::new(store.clone());
    let team_service = TeamService::new(store.clone());
    let match_service = MatchService::new(store.clone());

    // 22 registered football players.
    for n in 0..22 {
        let user = player(n, GameType::Football);
        store
            .put(collections::USERS, Some(&user.email), encode(&user).unwrap())
            .await
            .unwrap();
    }

    let event = events
        .create_event(
            "coach-1",
            EventInput {
                title: "Summer Cup".to_string(),
                description: None,
                location: "Stadium".to_string(),
                game_type: GameType::Football,
                event_date: Utc::now() + Duration::days(30),
                max_participants: 30,
            },
        )
        .await
        .unwrap();

    for n in 0..22 {
        events
            .join_event(&event.id, &format!("player-{n}"))
            .await
            .unwrap();
    }

    let available = team_service
        .available_participants(&event.id)
        .await
        .unwrap();
    assert_eq!(available.len(), 22);
    assert_eq!(available[0], "player-0");

    let lions = team_service
        .create_team("coach-1", new_team("Lions", &event.id, available[..11].to_vec()))
        .await
        .unwrap();
    let remaining = team_service
        .available_participants(&event.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 11);
    let tigers = team_service
        .create_team("coach-1", new_team("Tigers", &event.id, remaining))
        .await
        .unwrap();
    assert!(team_service
        .available_participants(&event.id)
        .await
        .unwrap()
        .is_empty());

    // Poaching a rostered player into a third team fails.
    let err = team_service
        .create_team(
            "coach-1",
            new_team("Wolves", &event.id, vec![lions.participants[0].clone()]),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClubError::Assignment(AssignmentError::AlreadyAssigned(_))
    ));

    // Played yesterday; the result comes in afterwards.
    let game = match_service
        .schedule_match(new_match(&lions.id, &tigers.id, Utc::now() - Duration::days(1)))
        .await
        .unwrap();
    assert_eq!(game.participants.len(), 22);

    let completed = match_service
        .announce_result(
            &game.id,
            ResultInput {
                winner: TeamSide::Team1,
                score: Some("2-0".to_string()),
                notes: None,
                announced_by: "coach-1".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        completed.result.as_ref().unwrap().winner_team_name,
        "Lions"
    );

    // Players see it in their sorted feed and in the history.
    let feed = match_service
        .matches_for_player("player-0", None, Utc::now())
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].status, MatchStatus::Completed);
    let history = match_service.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, game.id);
}
