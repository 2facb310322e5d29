pub mod acquisition;
pub mod company;
pub mod funding_round;
pub mod portfolio_company;
pub mod team_member;

pub use acquisition::Entity as Acquisition;
pub use company::Entity as Company;
pub use funding_round::Entity as FundingRound;
pub use portfolio_company::Entity as PortfolioCompany;
pub use team_member::Entity as TeamMember;
