//! Single binary web server: JSON REST API over the club services.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable via DNS on a VPS.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sports_club_web::service::{
    ClubError, EventInput, EventService, MatchService, MatchView, NewMatch, NewRegistration,
    NewTeam, RegistrationService, ResultInput, TeamService,
};
use sports_club_web::store::MemoryStore;
use sports_club_web::{countdown_to, derive_event_status, Countdown, Event, EventStatus, UserType};
use std::sync::Arc;

/// Club services sharing one document store.
struct Services {
    events: EventService,
    teams: TeamService,
    matches: MatchService,
    registration: RegistrationService,
}

impl Services {
    fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            events: EventService::new(store.clone()),
            teams: TeamService::new(store.clone()),
            matches: MatchService::new(store.clone()),
            registration: RegistrationService::new(store),
        }
    }
}

type AppState = Data<Services>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Event as the dashboard renders it: the record plus its derived status
/// and the countdown to its date.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventCard {
    status: EventStatus,
    countdown: Countdown,
    event: Event,
}

fn event_card(event: Event, now: DateTime<Utc>) -> EventCard {
    EventCard {
        status: derive_event_status(event.event_date, now),
        countdown: countdown_to(event.event_date, now),
        event,
    }
}

/// Map a service error onto the HTTP status it means: domain rejections are
/// the caller's fault, missing documents are 404, store trouble is 500, and
/// a partial multi-document failure is a bad gateway so clients know some
/// writes landed.
fn error_response(error: &ClubError) -> HttpResponse {
    let body = serde_json::json!({ "error": error.to_string() });
    match error {
        ClubError::NotFound { .. } => HttpResponse::NotFound().json(body),
        ClubError::NotOwner { .. } => HttpResponse::Forbidden().json(body),
        ClubError::Persistence(_) => HttpResponse::InternalServerError().json(body),
        ClubError::Partial(_) => HttpResponse::BadGateway().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventBody {
    coach_id: String,
    #[serde(flatten)]
    event: EventInput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTeamBody {
    coach_id: String,
    #[serde(flatten)]
    team: NewTeam,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoachQuery {
    coach_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListQuery {
    #[serde(default)]
    coach_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamListQuery {
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    coach_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchListQuery {
    #[serde(default)]
    coach_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
}

/// Path segment: document id (e.g. /api/events/{id})
#[derive(Deserialize)]
struct IdPath {
    id: String,
}

/// Path segment: registrant role (e.g. /api/selectable-games/player)
#[derive(Deserialize)]
struct RolePath {
    user_type: UserType,
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "sports-club-web",
    })
}

/// Register a member; players get approval requests fanned out to the
/// coaches of their selected games.
#[post("/api/register")]
async fn api_register(state: AppState, body: Json<NewRegistration>) -> HttpResponse {
    match state.registration.register(body.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(e) => error_response(&e),
    }
}

/// Games the registration form may offer for a role.
#[get("/api/selectable-games/{user_type}")]
async fn api_selectable_games(state: AppState, path: Path<RolePath>) -> HttpResponse {
    match state.registration.selectable_games(path.user_type).await {
        Ok(games) => HttpResponse::Ok().json(games),
        Err(e) => error_response(&e),
    }
}

/// Create an event owned by the posting coach.
#[post("/api/events")]
async fn api_create_event(state: AppState, body: Json<CreateEventBody>) -> HttpResponse {
    let CreateEventBody { coach_id, event } = body.into_inner();
    match state.events.create_event(&coach_id, event).await {
        Ok(created) => HttpResponse::Ok().json(created),
        Err(e) => error_response(&e),
    }
}

/// List events: all of them, one coach's (?coachId=), or one player's
/// joined ones (?userId=). Each comes with its derived status and countdown.
#[get("/api/events")]
async fn api_list_events(state: AppState, query: Query<EventListQuery>) -> HttpResponse {
    let result = if let Some(coach_id) = &query.coach_id {
        state.events.events_for_coach(coach_id).await
    } else if let Some(user_id) = &query.user_id {
        state.events.events_joined_by(user_id).await
    } else {
        state.events.all_events().await
    };
    match result {
        Ok(events) => {
            let now = Utc::now();
            let cards: Vec<EventCard> = events.into_iter().map(|e| event_card(e, now)).collect();
            HttpResponse::Ok().json(cards)
        }
        Err(e) => error_response(&e),
    }
}

#[get("/api/events/{id}")]
async fn api_get_event(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.events.event(&path.id).await {
        Ok(event) => HttpResponse::Ok().json(event_card(event, Utc::now())),
        Err(e) => error_response(&e),
    }
}

/// Edit an event (owning coach only).
#[put("/api/events/{id}")]
async fn api_update_event(
    state: AppState,
    path: Path<IdPath>,
    body: Json<CreateEventBody>,
) -> HttpResponse {
    let CreateEventBody { coach_id, event } = body.into_inner();
    match state.events.update_event(&coach_id, &path.id, event).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => error_response(&e),
    }
}

/// Delete an event (owning coach only, ?coachId=).
#[delete("/api/events/{id}")]
async fn api_delete_event(
    state: AppState,
    path: Path<IdPath>,
    query: Query<CoachQuery>,
) -> HttpResponse {
    match state.events.delete_event(&query.coach_id, &path.id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "deleted": path.id })),
        Err(e) => error_response(&e),
    }
}

/// Join the posting player onto an event.
#[post("/api/events/{id}/join")]
async fn api_join_event(state: AppState, path: Path<IdPath>, body: Json<UserBody>) -> HttpResponse {
    match state.events.join_event(&path.id, &body.user_id).await {
        Ok(event) => HttpResponse::Ok().json(event),
        Err(e) => error_response(&e),
    }
}

/// Remove the posting player from an event.
#[post("/api/events/{id}/leave")]
async fn api_leave_event(
    state: AppState,
    path: Path<IdPath>,
    body: Json<UserBody>,
) -> HttpResponse {
    match state.events.leave_event(&path.id, &body.user_id).await {
        Ok(event) => HttpResponse::Ok().json(event),
        Err(e) => error_response(&e),
    }
}

/// Event participants not yet on any team, in join order.
#[get("/api/events/{id}/available-participants")]
async fn api_available_participants(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.teams.available_participants(&path.id).await {
        Ok(available) => HttpResponse::Ok().json(available),
        Err(e) => error_response(&e),
    }
}

/// Create a team from unassigned event participants.
#[post("/api/teams")]
async fn api_create_team(state: AppState, body: Json<CreateTeamBody>) -> HttpResponse {
    let CreateTeamBody { coach_id, team } = body.into_inner();
    match state.teams.create_team(&coach_id, team).await {
        Ok(created) => HttpResponse::Ok().json(created),
        Err(e) => error_response(&e),
    }
}

/// List teams by event (?eventId=), coach (?coachId=), or rostered player
/// (?userId=).
#[get("/api/teams")]
async fn api_list_teams(state: AppState, query: Query<TeamListQuery>) -> HttpResponse {
    let result = if let Some(event_id) = &query.event_id {
        state.teams.teams_for_event(event_id).await
    } else if let Some(coach_id) = &query.coach_id {
        state.teams.teams_for_coach(coach_id).await
    } else if let Some(user_id) = &query.user_id {
        state.teams.teams_for_player(user_id).await
    } else {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Provide eventId, coachId, or userId" }));
    };
    match result {
        Ok(teams) => HttpResponse::Ok().json(teams),
        Err(e) => error_response(&e),
    }
}

#[get("/api/teams/{id}")]
async fn api_get_team(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.teams.team(&path.id).await {
        Ok(team) => HttpResponse::Ok().json(team),
        Err(e) => error_response(&e),
    }
}

/// Pair two committed teams into a scheduled match.
#[post("/api/matches")]
async fn api_schedule_match(state: AppState, body: Json<NewMatch>) -> HttpResponse {
    match state.matches.schedule_match(body.into_inner()).await {
        Ok(scheduled) => HttpResponse::Ok().json(scheduled),
        Err(e) => error_response(&e),
    }
}

/// Completed matches, newest announcement first.
#[get("/api/matches/history")]
async fn api_match_history(state: AppState) -> HttpResponse {
    match state.matches.history().await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => error_response(&e),
    }
}

/// List matches for a coach (?coachId=) or a player (?userId=), optionally
/// narrowed to one event (?eventId=), sorted action-needed first.
#[get("/api/matches")]
async fn api_list_matches(state: AppState, query: Query<MatchListQuery>) -> HttpResponse {
    let now = Utc::now();
    let event_id = query.event_id.as_deref();
    let result = if let Some(coach_id) = &query.coach_id {
        state
            .matches
            .matches_for_coach(coach_id, event_id, now)
            .await
    } else if let Some(user_id) = &query.user_id {
        state
            .matches
            .matches_for_player(user_id, event_id, now)
            .await
    } else {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Provide coachId or userId" }));
    };
    match result {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => error_response(&e),
    }
}

#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.matches.match_by_id(&path.id).await {
        Ok(found) => HttpResponse::Ok().json(MatchView::new(found, Utc::now())),
        Err(e) => error_response(&e),
    }
}

/// Announce the result of a played match (exactly once).
#[post("/api/matches/{id}/result")]
async fn api_announce_result(
    state: AppState,
    path: Path<IdPath>,
    body: Json<ResultInput>,
) -> HttpResponse {
    match state
        .matches
        .announce_result(&path.id, body.into_inner())
        .await
    {
        Ok(completed) => HttpResponse::Ok().json(completed),
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = Arc::new(MemoryStore::new());
    let services = Data::new(Services::new(store));

    HttpServer::new(move || {
        App::new()
            .app_data(services.clone())
            .service(api_health)
            .service(api_register)
            .service(api_selectable_games)
            .service(api_create_event)
            .service(api_list_events)
            .service(api_get_event)
            .service(api_update_event)
            .service(api_delete_event)
            .service(api_join_event)
            .service(api_leave_event)
            .service(api_available_participants)
            .service(api_create_team)
            .service(api_list_teams)
            .service(api_get_team)
            .service(api_schedule_match)
            // history before {id} so the literal segment wins
            .service(api_match_history)
            .service(api_list_matches)
            .service(api_get_match)
            .service(api_announce_result)
    })
    .bind(bind)?
    .run()
    .await
}
