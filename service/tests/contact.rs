//! Workflow tests of contacting [`Land`] owners.

mod support;

use std::time::Duration;

use service::{
    command::{
        decide_contact::{self, Decided},
        request_contact, DecideContact, RequestContact, SignLandAsOwner,
    },
    domain::{
        contact_request::{self, Decision},
        land, user, ContactRequest, Land, User,
    },
    query, read, Command as _,
};

use self::support::World;

async fn request(world: &World, land: &Land, from: &User) -> ContactRequest {
    world
        .service
        .execute(RequestContact {
            land_id: land.id,
            from_user: from.id,
            message: "Is the canal water available all year?".parse().unwrap(),
        })
        .await
        .unwrap()
}

/// Lets the clock advance, so creation times of entities differ.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

async fn decide(
    world: &World,
    request: &ContactRequest,
    decision: Decision,
) -> Result<Decided, tracerr::Traced<decide_contact::ExecutionError>> {
    world
        .service
        .execute(DecideContact {
            request_id: request.id,
            decider_id: world.owner.id,
            decision,
        })
        .await
}

#[tokio::test]
async fn leases_on_accepted_contact() {
    let world = World::new().await;
    let land = world.paid_land().await;

    let req = request(&world, &land, &world.farmer).await;
    assert_eq!(req.status, contact_request::Status::Pending);
    assert_eq!(req.to_owner, world.owner.id);
    assert!(req.decided_at.is_none());

    let delivered = world.outbox.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, "New Contact Request");
    assert_eq!(delivered[0].recipients.len(), 1);
    assert!(delivered[0].body.contains("Asha"));
    assert!(delivered[0].body.contains("canal water"));

    let Decided { request, land } =
        decide(&world, &req, Decision::Accept).await.unwrap();
    assert_eq!(request.status, contact_request::Status::Accepted);
    assert!(request.decided_at.is_some());
    let land = land.unwrap();
    assert_eq!(land.status, land::Status::Leased);
    assert_eq!(land.leased_via, Some(land::Path::ContactAccepted));
    assert_eq!(land.acquired_by, Some(world.farmer.id));
    assert_eq!(land.final_document, None);

    let stored = world.land(land.id).await;
    assert_eq!(stored.status, land::Status::Leased);
    let stored = world
        .service
        .execute(query::contact_request::ById::by(req.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, contact_request::Status::Accepted);

    let delivered = world.outbox.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].subject, "Land Lease Agreement Completed");
    assert_eq!(delivered[1].recipients.len(), 2);
    assert_eq!(delivered[1].attachment, None);
}

#[tokio::test]
async fn accepts_contact_after_owner_signed() {
    let world = World::new().await;
    let land = world.paid_land().await;
    let req = request(&world, &land, &world.other_farmer).await;
    _ = world
        .service
        .execute(SignLandAsOwner {
            land_id: land.id,
            owner_id: world.owner.id,
        })
        .await
        .unwrap();

    let Decided { land, .. } =
        decide(&world, &req, Decision::Accept).await.unwrap();
    let land = land.unwrap();

    assert_eq!(land.status, land::Status::Leased);
    assert_eq!(land.acquired_by, Some(world.other_farmer.id));
    assert!(land.owner_signed_document.is_some());
}

#[tokio::test]
async fn forbids_contacting_oneself() {
    let world = World::new().await;
    let land = world.paid_land().await;

    let err = world
        .service
        .execute(RequestContact {
            land_id: land.id,
            from_user: world.owner.id,
            message: "".parse().unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        request_contact::ExecutionError::SelfContact(_),
    ));

    let requests = world
        .service
        .execute(query::contact_requests::ByLand::by(land.id))
        .await
        .unwrap();
    assert!(requests.is_empty());
    assert!(world.outbox.delivered().is_empty());
}

#[tokio::test]
async fn forbids_contacting_by_unknown_users() {
    let world = World::new().await;
    let land = world.paid_land().await;
    let stranger = user::Id::new();

    let found = world
        .service
        .execute(query::user::ById::by(stranger))
        .await
        .unwrap();
    assert!(found.is_none());
    let farmer = world
        .service
        .execute(query::user::ById::by(world.farmer.id))
        .await
        .unwrap();
    assert_eq!(farmer.map(|u| u.id), Some(world.farmer.id));

    let err = world
        .service
        .execute(RequestContact {
            land_id: land.id,
            from_user: stranger,
            message: "".parse().unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        request_contact::ExecutionError::UserNotExists(id) if *id == stranger,
    ));
}

#[tokio::test]
async fn allows_only_owner_to_decide() {
    let world = World::new().await;
    let land = world.paid_land().await;
    let req = request(&world, &land, &world.farmer).await;

    for decision in [Decision::Accept, Decision::Reject] {
        let err = world
            .service
            .execute(DecideContact {
                request_id: req.id,
                decider_id: world.other_farmer.id,
                decision,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            decide_contact::ExecutionError::NotOwner(id)
                if *id == world.other_farmer.id,
        ));
    }

    assert_eq!(world.land(land.id).await.status, land::Status::Available);
}

#[tokio::test]
async fn decides_only_once() {
    let world = World::new().await;
    let land = world.paid_land().await;
    let req = request(&world, &land, &world.farmer).await;

    let Decided { request, land: none } =
        decide(&world, &req, Decision::Reject).await.unwrap();
    assert_eq!(request.status, contact_request::Status::Rejected);
    assert!(none.is_none());

    for decision in [Decision::Reject, Decision::Accept] {
        let err = decide(&world, &req, decision).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            decide_contact::ExecutionError::AlreadyDecided(
                contact_request::AlreadyDecided(
                    contact_request::Status::Rejected,
                ),
            ),
        ));
    }
    assert_eq!(world.land(land.id).await.status, land::Status::Available);
}

#[tokio::test]
async fn notifies_requester_on_rejection() {
    let world = World::new().await;
    let land = world.paid_land().await;
    let req = request(&world, &land, &world.farmer).await;

    _ = decide(&world, &req, Decision::Reject).await.unwrap();

    let delivered = world.outbox.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].subject, "Contact Request Declined");
    assert_eq!(delivered[1].recipients.len(), 1);
    assert_eq!(
        delivered[1].recipients[0].email.as_ref().map(ToString::to_string),
        Some("asha@farm.in".into()),
    );
}

#[tokio::test]
async fn accepts_single_contact_per_land() {
    let world = World::new().await;
    let land = world.paid_land().await;
    let first = request(&world, &land, &world.farmer).await;
    let second = request(&world, &land, &world.other_farmer).await;

    _ = decide(&world, &first, Decision::Accept).await.unwrap();
    let err = decide(&world, &second, Decision::Accept).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        decide_contact::ExecutionError::Transition(
            land::TransitionError::InvalidStatus {
                status: land::Status::Leased,
                ..
            },
        ),
    ));

    let second = world
        .service
        .execute(query::contact_request::ById::by(second.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status, contact_request::Status::Pending);
    assert_eq!(
        world.land(land.id).await.acquired_by,
        Some(world.farmer.id),
    );
}

#[tokio::test]
async fn retries_failed_notifications() {
    let world = World::new().await;
    let land = world.paid_land().await;
    world.outbox.fail_next(1);

    _ = request(&world, &land, &world.farmer).await;

    assert_eq!(world.outbox.attempts(), 2);
    assert_eq!(world.outbox.delivered().len(), 1);
}

#[tokio::test]
async fn keeps_request_when_notification_fails() {
    let world = World::new().await;
    let land = world.paid_land().await;
    world.outbox.fail_next(10);

    let req = request(&world, &land, &world.farmer).await;

    assert_eq!(world.outbox.attempts(), 2);
    assert!(world.outbox.delivered().is_empty());
    let stored = world
        .service
        .execute(query::contact_request::ById::by(req.id))
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn lists_requests_of_owner_and_land() {
    let world = World::new().await;
    let paid = world.paid_land().await;
    let sharing = world.sharing_land().await;

    let first = request(&world, &paid, &world.farmer).await;
    tick().await;
    let second = request(&world, &sharing, &world.other_farmer).await;
    tick().await;
    let third = request(&world, &paid, &world.other_farmer).await;

    let for_owner = world
        .service
        .execute(query::contact_requests::ForOwner::by(world.owner.id))
        .await
        .unwrap();
    assert_eq!(
        for_owner.iter().map(|r| r.id).collect::<Vec<_>>(),
        [third.id, second.id, first.id],
    );

    let for_farmer = world
        .service
        .execute(query::contact_requests::ForOwner::by(world.farmer.id))
        .await
        .unwrap();
    assert!(for_farmer.is_empty());

    let by_land = world
        .service
        .execute(query::contact_requests::ByLand::by(paid.id))
        .await
        .unwrap();
    assert_eq!(
        by_land.iter().map(|r| r.id).collect::<Vec<_>>(),
        [third.id, first.id],
    );
}

#[tokio::test]
async fn lists_lands_by_filter() {
    let world = World::new().await;
    let paid = world.paid_land().await;
    tick().await;
    let sharing = world.sharing_land().await;
    let req = request(&world, &paid, &world.farmer).await;
    _ = decide(&world, &req, Decision::Accept).await.unwrap();

    let list = |filter| world.service.execute(query::lands::List::by(filter));

    let all = list(read::land::list::Filter::default()).await.unwrap();
    assert_eq!(
        all.iter().map(|l| l.id).collect::<Vec<_>>(),
        [sharing.id, paid.id],
    );

    let available = list(read::land::list::Filter {
        status: Some(land::Status::Available),
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(
        available.iter().map(|l| l.id).collect::<Vec<_>>(),
        [sharing.id],
    );

    let leased_by_owner = list(read::land::list::Filter {
        status: Some(land::Status::Leased),
        owner_id: Some(world.owner.id),
        keyword: Some("ACRES".into()),
        location: Some("nashik".into()),
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(
        leased_by_owner.iter().map(|l| l.id).collect::<Vec<_>>(),
        [paid.id],
    );

    let of_farmer = list(read::land::list::Filter {
        owner_id: Some(world.farmer.id),
        ..Default::default()
    })
    .await
    .unwrap();
    assert!(of_farmer.is_empty());
}
