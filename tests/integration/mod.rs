mod database_integration;
