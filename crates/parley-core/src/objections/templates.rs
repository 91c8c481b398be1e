//! Response templates per objection type and graduation level.
//!
//! Placeholders use `{name}` and resolve against [`MarketData`](crate::types::MarketData):
//! `median_price`, `gap_percent`, `days_on_market`, `comparable_count`,
//! `price_per_sqft`, `neighborhood`, `list_to_sale_ratio`,
//! `price_reduction_percent`.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::{ObjectionType, ResponseGraduation};

/// Variants available for one `(type, level)` pair, in A/B order.
pub type TemplateTable = HashMap<(ObjectionType, ResponseGraduation), Vec<&'static str>>;

fn ladder(table: &mut TemplateTable, objection_type: ObjectionType, rungs: [&[&'static str]; 4]) {
    for (level, variants) in ResponseGraduation::LEVELS.into_iter().zip(rungs) {
        table
            .entry((objection_type, level))
            .or_default()
            .extend_from_slice(variants);
    }
}

lazy_static! {
    /// One variant per rung for the five pricing-specific types.
    pub static ref PRICING_TEMPLATES: TemplateTable = {
        use ObjectionType::*;
        let mut t = TemplateTable::new();

        ladder(&mut t, LossAversion, [
            &["I completely understand. Nobody wants to walk away with less than they put in, and that's a fair thing to want."],
            &["Here's where the market sits today: homes like yours in {neighborhood} are closing around {median_price}, about {gap_percent} away from where you'd like to be."],
            &["A lot of sellers I've worked with felt the same way. The ones who priced near {median_price} sold in about {days_on_market} days and moved on to their next chapter."],
            &["What if we listed at your number for two weeks and let the buyers tell us? If the showings aren't there, we'll know the market has spoken."],
        ]);
        ladder(&mut t, Anchoring, [
            &["Online estimates are a good starting point, and it makes sense you'd look at them first."],
            &["Those estimates don't see inside your home. The {comparable_count} actual sales nearby closed at a median of {median_price}, or {price_per_sqft} per square foot."],
            &["Most of my sellers came in with an online number too. The homes that sold fastest were priced off real closings, not algorithms."],
            &["Let's put it to the test: we can list at the estimate and watch the first week of showings. Buyers will show us which number is real."],
        ]);
        ladder(&mut t, NeighborComp, [
            &["That's great news for the street, and I can see why it sets your expectations."],
            &["Every house sells on its own details. Across the last {comparable_count} sales in {neighborhood}, the median was {median_price} at {price_per_sqft} per square foot."],
            &["I've seen this often: one strong sale nearby, then the next few homes list high and sit. The ones priced to the median went under contract in about {days_on_market} days."],
            &["Why don't we price close to your neighbor's sale and set a check-in after ten days? The market feedback will tell us if we need to adjust."],
        ]);
        ladder(&mut t, MarketDenial, [
            &["You're right that the market was on fire not long ago. It's natural to expect that to continue."],
            &["Things have shifted: homes are averaging {days_on_market} days on market now and selling at {list_to_sale_ratio} of list price."],
            &["Sellers who adjusted early this season sold cleanly. Those who waited averaged a {price_reduction_percent} reduction later."],
            &["Let's list where you're comfortable and agree on a date to review. If buyers are as eager as you think, we'll see it right away."],
        ]);
        ladder(&mut t, ImprovementOvervalue, [
            &["You clearly put a lot of care into the home, and buyers will notice that."],
            &["Upgrades help a home sell, but they rarely return dollar for dollar. Updated homes here closed near {median_price}, about {price_per_sqft} per square foot."],
            &["Other sellers with new kitchens and baths found buyers valued the move-in condition more than the receipts. Those homes sold in about {days_on_market} days."],
            &["We can lead the marketing with your upgrades and price a little above the median to see if buyers will pay for them."],
        ]);

        t
    };

    /// Two variants per rung for all eleven types.
    ///
    /// Variant 0 of each pricing-specific type matches [`PRICING_TEMPLATES`].
    pub static ref EXTENDED_TEMPLATES: TemplateTable = {
        use ObjectionType::*;
        let mut t = PRICING_TEMPLATES.clone();

        ladder(&mut t, LossAversion, [
            &["That's a completely reasonable concern. Your home is one of the biggest investments you'll make."],
            &["To give you the full picture: the median nearby is {median_price}, which puts the gap at about {gap_percent}."],
            &["I recently helped a family in the same spot. They priced near {median_price}, sold in {days_on_market} days, and came out ahead on their next purchase."],
            &["Would you be open to a short test at your price? If we don't get traction in two weeks, we revisit together."],
        ]);
        ladder(&mut t, Anchoring, [
            &["I hear you. Those numbers are everywhere and they feel official."],
            &["Automated values can be off by a lot. Real closings in {neighborhood} point to {median_price}."],
            &["Plenty of homeowners start with the online figure. The ones who went with actual comps sold faster and with fewer price cuts."],
            &["How about we list at the online number and let the first round of showings confirm it or correct it?"],
        ]);
        ladder(&mut t, NeighborComp, [
            &["It's exciting when a nearby home sells well. It shows people want to live on your street."],
            &["Looking past that one sale, {comparable_count} homes around you sold at a median of {median_price}."],
            &["Neighbors of a record sale often list high and wait. The ones priced to the market closed in about {days_on_market} days."],
            &["Let's try a price near that sale for a short window and see how buyers respond."],
        ]);
        ladder(&mut t, MarketDenial, [
            &["I get it. It wasn't long ago that everything sold in a weekend."],
            &["The latest numbers show {days_on_market} days on market and a {list_to_sale_ratio} list-to-sale ratio."],
            &["The sellers doing best right now are the ones who priced to today's market from day one."],
            &["Let's list at your number and set a two-week review. The showings will tell us which way the market is leaning."],
        ]);
        ladder(&mut t, ImprovementOvervalue, [
            &["Those improvements make a real difference in how the home shows."],
            &["Renovated homes nearby sold around {median_price}, so the upgrades are already part of that number."],
            &["I've had sellers with similar projects. Buyers loved the finishes and paid for condition, not cost."],
            &["We can feature every upgrade in the listing and test a price slightly above the comps."],
        ]);

        ladder(&mut t, PricingGeneral, [
            &["I understand the number matters. Let's make sure it's the right one for you.",
              "That's fair. Price is the first thing everyone looks at."],
            &["Here's what the data says: homes like yours are selling around {median_price}, about {price_per_sqft} per square foot.",
              "Recent sales in {neighborhood} put your home near {median_price}, with {comparable_count} comparable closings."],
            &["Most sellers I work with land within a few percent of the median, and they usually sell within {days_on_market} days.",
              "Sellers who priced with the comps this year sold faster and negotiated from strength."],
            &["What if we listed at a number you're comfortable with and reviewed buyer feedback after the first week?",
              "Let's test the market at your price for a short window and adjust only if the showings tell us to."],
        ]);
        ladder(&mut t, TimingNotReady, [
            &["No pressure at all. This should happen on your timeline.",
              "That makes sense. Selling is a big decision and it shouldn't be rushed."],
            &["Just so you have it: homes are averaging {days_on_market} days on market right now, and the median sits at {median_price}.",
              "For planning purposes, the current median in {neighborhood} is {median_price} and it's moving month to month."],
            &["Many of my clients started by just getting their numbers in order months ahead. It made the move much easier when they were ready.",
              "Other sellers found it helpful to prepare early so they could move quickly when the timing felt right."],
            &["Would it help if I checked in next month with fresh numbers so you can decide when the time is right?",
              "How about I send a quick market update each month, and you tell me when you want to talk next steps?"],
        ]);
        ladder(&mut t, CompetitionShopping, [
            &["Smart move. You should talk to a few people before you decide.",
              "That's exactly what you should be doing with a decision this big."],
            &["When you compare, look at results: our listings sell at {list_to_sale_ratio} of list in about {days_on_market} days.",
              "One thing to compare is pricing accuracy. We price off the {comparable_count} real sales nearby, currently a median of {median_price}."],
            &["A lot of sellers interviewed several agents and chose us for the data and the follow-through.",
              "Sellers who compared options told us the clear pricing plan is what made the difference."],
            &["Ask every agent for their pricing plan in writing, and let's put ours side by side with theirs.",
              "Take our numbers with you to your other meetings. If someone beats the plan, you should know."],
        ]);
        ladder(&mut t, TrustCredibility, [
            &["That's a healthy question to ask. You should feel fully comfortable before sharing anything.",
              "I appreciate you being direct. Trust has to be earned."],
            &["Everything we share comes from public records. The {comparable_count} recent sales near you have a median of {median_price}, and you can verify each one.",
              "You don't have to take my word for it. County records show homes in {neighborhood} closing around {median_price}."],
            &["Plenty of our clients started out skeptical. Their reviews talk about how transparent the process was.",
              "Many homeowners were cautious at first and ended up referring their friends and family."],
            &["Would it help to start with a no-obligation pricing review you can check against any source you like?",
              "Let me send you the raw sales data first. Check it yourself, then decide if we talk further."],
        ]);
        ladder(&mut t, AuthorityDecisionMaker, [
            &["Of course. Everyone who has a say should be part of this.",
              "That makes total sense. A decision like this should be made together."],
            &["I can put together a short summary for everyone: a median of {median_price} nearby and about {days_on_market} days on market.",
              "It might help to share the numbers: homes in {neighborhood} are selling around {median_price}."],
            &["A lot of families find it easier to decide once everyone hears the same information at the same time.",
              "Other sellers found that a quick call with everyone involved answered most of the questions up front."],
            &["Would a short call with everyone involved this week work? I can walk through the numbers once for all of you.",
              "Let's set up a time when everyone can join, and I'll bring the market data so the decision is easier."],
        ]);
        ladder(&mut t, ValueProposition, [
            &["Great question. You should know exactly what you're getting.",
              "That's the right thing to ask before hiring anyone."],
            &["Here's the difference in numbers: our sellers close at {list_to_sale_ratio} of list in about {days_on_market} days.",
              "Priced right, homes like yours are selling near {median_price}. Getting you there is the job."],
            &["Sellers who tried it alone often came back after a few weeks. With a plan, they netted more even after fees.",
              "Many of our clients compared going it alone and found the pricing and negotiation more than covered the cost."],
            &["Let me put together a net sheet both ways, with and without us, and you decide which comes out ahead.",
              "How about we run the numbers side by side? If we don't add value, you'll see it right there."],
        ]);

        t
    };
}
