use engine::{
    CreateTransactionCmd, EngineError, MoneyCents, UpdateBillCmd, UpdateUserCmd,
};

mod common;

use common::{cents, date, engine, probed_engine, user_with_bill};

#[tokio::test]
async fn users_are_unique_by_email() {
    let engine = engine().await;
    let alice = engine
        .create_user(" Alice ", "Alice@Example.com")
        .await
        .unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.email, "alice@example.com");
    assert_eq!(alice.balance, MoneyCents::ZERO);

    let err = engine
        .create_user("Impostor", "alice@example.com")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey("alice@example.com".to_string())
    );

    assert_eq!(
        engine.user_by_email("ALICE@example.com").await.unwrap(),
        alice
    );
    assert!(matches!(
        engine.create_user("", "nobody@example.com").await.unwrap_err(),
        EngineError::InvalidInput(_)
    ));
    assert!(matches!(
        engine.create_user("Nobody", "not-an-email").await.unwrap_err(),
        EngineError::InvalidInput(_)
    ));
    assert_eq!(engine.users().await.unwrap(), vec![alice]);
}

#[tokio::test]
async fn email_taken_behind_the_lookup_is_an_existing_key() {
    let (engine, probe) = probed_engine(3).await;
    engine.create_user("Alice", "alice@example.com").await.unwrap();
    let bob = engine.create_user("Bob", "bob@example.com").await.unwrap();

    probe.hide_emails(true);
    let err = engine
        .create_user("Other Alice", "Alice@example.com")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey("alice@example.com".to_string())
    );
    let err = engine
        .update_user(UpdateUserCmd::new(bob.id).email("alice@example.com"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey("alice@example.com".to_string())
    );
    probe.hide_emails(false);

    assert_eq!(engine.user(bob.id).await.unwrap(), bob);
    assert_eq!(engine.users().await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_user_keeps_the_balance() {
    let engine = engine().await;
    let (alice, _) = user_with_bill(&engine, "alice@example.com", 700).await;
    engine.create_user("Bob", "bob@example.com").await.unwrap();

    let updated = engine
        .update_user(UpdateUserCmd::new(alice.id).name("Alice Smith"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice Smith");
    assert_eq!(updated.email, "alice@example.com");
    assert_eq!(updated.balance, cents(700));

    let err = engine
        .update_user(UpdateUserCmd::new(alice.id).email("bob@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let moved = engine
        .update_user(UpdateUserCmd::new(alice.id).email("smith@example.com"))
        .await
        .unwrap();
    assert_eq!(engine.user(alice.id).await.unwrap(), moved);
}

#[tokio::test]
async fn bills_feed_the_user_aggregate() {
    let engine = engine().await;
    let user = engine
        .create_user("Alice", "alice@example.com")
        .await
        .unwrap();
    let card = engine.create_bill(user.id, "Card", cents(1000)).await.unwrap();
    let cash = engine.create_bill(user.id, "Cash", cents(250)).await.unwrap();
    assert_eq!(engine.user(user.id).await.unwrap().balance, cents(1250));
    assert_eq!(
        engine.bills_for_user(user.id).await.unwrap(),
        vec![card.clone(), cash.clone()]
    );

    let corrected = engine
        .update_bill(UpdateBillCmd::new(card.id).balance(cents(900)).name("Debit card"))
        .await
        .unwrap();
    assert_eq!(corrected.name, "Debit card");
    assert_eq!(corrected.balance, cents(900));
    assert_eq!(engine.user(user.id).await.unwrap().balance, cents(1150));

    let err = engine
        .update_bill(UpdateBillCmd::new(card.id).balance(cents(-1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    engine.delete_bill(cash.id).await.unwrap();
    assert_eq!(engine.user(user.id).await.unwrap().balance, cents(900));
    assert!(matches!(
        engine.bill(cash.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn bill_creation_is_validated() {
    let engine = engine().await;
    let user = engine
        .create_user("Alice", "alice@example.com")
        .await
        .unwrap();

    for (name, balance) in [("Card", -5), ("  ", 10)] {
        let err = engine
            .create_bill(user.id, name, cents(balance))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)), "{name}");
    }
    assert!(matches!(
        engine.create_bill(77, "Card", cents(10)).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
    assert_eq!(engine.user(user.id).await.unwrap().balance, MoneyCents::ZERO);
}

#[tokio::test]
async fn deleting_a_bill_removes_its_transactions() {
    let engine = engine().await;
    let (user, bill) = user_with_bill(&engine, "alice@example.com", 100).await;
    let tag = engine.create_tag(user.id, "rent").await.unwrap();
    let tx = engine
        .create_transaction(
            CreateTransactionCmd::expense(user.id, bill.id, "Rent", cents(60), date(2024, 1, 1))
                .tag_ids([tag.id]),
        )
        .await
        .unwrap();

    engine.delete_bill(bill.id).await.unwrap();

    assert!(matches!(
        engine.transaction(tx.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
    assert_eq!(engine.user(user.id).await.unwrap().balance, MoneyCents::ZERO);
    assert_eq!(engine.tags_for_user(user.id).await.unwrap(), vec![tag]);
}

#[tokio::test]
async fn tags_belong_to_users() {
    let engine = engine().await;
    let (user, bill) = user_with_bill(&engine, "alice@example.com", 100).await;
    let food = engine.create_tag(user.id, " food ").await.unwrap();
    assert_eq!(food.name, "food");
    assert_eq!(engine.tag(food.id).await.unwrap(), food);
    assert!(matches!(
        engine.create_tag(user.id, "").await.unwrap_err(),
        EngineError::InvalidInput(_)
    ));
    assert!(matches!(
        engine.create_tag(404, "ghost").await.unwrap_err(),
        EngineError::NotFound(_)
    ));

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::expense(user.id, bill.id, "Pizza", cents(12), date(2024, 2, 1))
                .tag_ids([food.id]),
        )
        .await
        .unwrap();

    engine.delete_tag(food.id).await.unwrap();
    assert!(engine.tags_for_user(user.id).await.unwrap().is_empty());
    assert!(engine.transaction(tx.id).await.unwrap().tags.is_empty());
    assert!(matches!(
        engine.delete_tag(food.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn deleting_a_user_removes_everything_it_owns() {
    let engine = engine().await;
    let (alice, bill) = user_with_bill(&engine, "alice@example.com", 100).await;
    let (bob, bob_bill) = user_with_bill(&engine, "bob@example.com", 50).await;
    let tag = engine.create_tag(alice.id, "misc").await.unwrap();
    let tx = engine
        .create_transaction(
            CreateTransactionCmd::income(alice.id, bill.id, "Gift", cents(10), date(2024, 3, 1))
                .tag_ids([tag.id]),
        )
        .await
        .unwrap();
    engine.transactions_for_user(alice.id).await.unwrap();
    assert_eq!(engine.cache().len(), 1);

    engine.delete_user(alice.id).await.unwrap();

    assert!(engine.cache().is_empty());
    for err in [
        engine.user(alice.id).await.unwrap_err(),
        engine.bill(bill.id).await.unwrap_err(),
        engine.tag(tag.id).await.unwrap_err(),
        engine.transaction(tx.id).await.unwrap_err(),
        engine.transactions_for_user(alice.id).await.unwrap_err(),
    ] {
        assert!(matches!(err, EngineError::NotFound(_)), "{err}");
    }
    assert_eq!(engine.users().await.unwrap(), vec![engine.user(bob.id).await.unwrap()]);
    assert_eq!(engine.bill(bob_bill.id).await.unwrap().balance, cents(50));
}

#[tokio::test]
async fn listings_span_every_user() {
    let engine = engine().await;
    let (alice, alice_bill) = user_with_bill(&engine, "alice@example.com", 300).await;
    let (bob, bob_bill) = user_with_bill(&engine, "bob@example.com", 200).await;
    let alice_tag = engine.create_tag(alice.id, "food").await.unwrap();
    let bob_tag = engine.create_tag(bob.id, "fuel").await.unwrap();
    let lunch = engine
        .create_transaction(CreateTransactionCmd::expense(
            alice.id,
            alice_bill.id,
            "Lunch",
            cents(15),
            date(2024, 7, 1),
        ))
        .await
        .unwrap();
    let refill = engine
        .create_transaction(CreateTransactionCmd::expense(
            bob.id,
            bob_bill.id,
            "Refill",
            cents(40),
            date(2024, 7, 2),
        ))
        .await
        .unwrap();

    let bills = engine.bills().await.unwrap();
    assert_eq!(
        bills.iter().map(|bill| bill.id).collect::<Vec<_>>(),
        vec![alice_bill.id, bob_bill.id]
    );
    assert_eq!(engine.tags().await.unwrap(), vec![alice_tag, bob_tag]);
    assert_eq!(engine.transactions().await.unwrap(), vec![lunch, refill]);
}

#[tokio::test]
async fn transactions_are_found_by_tag() {
    let engine = engine().await;
    let (user, bill) = user_with_bill(&engine, "alice@example.com", 500).await;
    let food = engine.create_tag(user.id, "food").await.unwrap();
    let fun = engine.create_tag(user.id, "fun").await.unwrap();

    let dinner = engine
        .create_transaction(
            CreateTransactionCmd::expense(user.id, bill.id, "Dinner", cents(30), date(2024, 8, 1))
                .tag_ids([food.id, fun.id]),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::expense(user.id, bill.id, "Cinema", cents(12), date(2024, 8, 2))
                .tag_ids([fun.id]),
        )
        .await
        .unwrap();
    let groceries = engine
        .create_transaction(
            CreateTransactionCmd::expense(user.id, bill.id, "Groceries", cents(55), date(2024, 8, 3))
                .tag_ids([food.id]),
        )
        .await
        .unwrap();

    assert_eq!(
        engine.transactions_for_tag(food.id).await.unwrap(),
        vec![dinner, groceries]
    );
    assert_eq!(engine.transactions_for_tag(fun.id).await.unwrap().len(), 2);
    assert_eq!(
        engine.transactions_for_tag(999).await.unwrap_err(),
        EngineError::NotFound("tag 999".to_string())
    );
}

#[tokio::test]
async fn renamed_tag_shows_on_its_transactions() {
    let engine = engine().await;
    let (user, bill) = user_with_bill(&engine, "alice@example.com", 100).await;
    let tag = engine.create_tag(user.id, "fod").await.unwrap();
    let tx = engine
        .create_transaction(
            CreateTransactionCmd::expense(user.id, bill.id, "Bread", cents(3), date(2024, 9, 1))
                .tag_ids([tag.id]),
        )
        .await
        .unwrap();
    engine.transactions_for_user(user.id).await.unwrap();
    assert_eq!(engine.cache().len(), 1);

    let renamed = engine.update_tag(tag.id, "  food ").await.unwrap();
    assert_eq!(renamed.name, "food");
    assert_eq!(renamed.user_id, user.id);
    assert!(engine.cache().is_empty());

    let listed = engine.transactions_for_user(user.id).await.unwrap();
    assert_eq!(listed[0].id, tx.id);
    assert_eq!(listed[0].tags, vec![renamed.clone()]);
    assert_eq!(engine.tag(tag.id).await.unwrap(), renamed);

    assert!(matches!(
        engine.update_tag(tag.id, " ").await.unwrap_err(),
        EngineError::InvalidInput(_)
    ));
    assert!(matches!(
        engine.update_tag(404, "ghost").await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}
